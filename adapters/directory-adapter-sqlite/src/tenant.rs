//! Tenant catalog operations

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::utils::*;
use collegio::{directory_adapter::*, prelude::*, types::now};

fn tenant_from_row(row: SqliteRow) -> Result<Tenant, sqlx::Error> {
	Ok(Tenant {
		tn_id: TnId(row.try_get("tn_id")?),
		code: row.try_get("code")?,
		name: row.try_get("name")?,
		active: row.try_get("active")?,
		created_at: Timestamp(row.try_get("created_at")?),
	})
}

pub(crate) async fn read_tenant(db: &SqlitePool, tn_id: TnId) -> ClResult<Tenant> {
	let res = sqlx::query("SELECT tn_id, code, name, active, created_at FROM tenants WHERE tn_id = ?1")
		.bind(tn_id.0)
		.fetch_one(db)
		.await;

	map_res(res, tenant_from_row)
}

/// The one unscoped lookup: used by the scoping middleware to resolve the
/// inbound header before a scope exists.
pub(crate) async fn read_tenant_by_code(db: &SqlitePool, code: &str) -> ClResult<Tenant> {
	let res = sqlx::query("SELECT tn_id, code, name, active, created_at FROM tenants WHERE code = ?1")
		.bind(code)
		.fetch_one(db)
		.await;

	map_res(res, tenant_from_row)
}

pub(crate) async fn list_tenants(
	db: &SqlitePool,
	scope: ScopeFilter,
	opts: &ListTenantsOptions<'_>,
) -> ClResult<Vec<Tenant>> {
	if scope == ScopeFilter::Empty {
		return Ok(vec![]);
	}

	let mut query = sqlx::QueryBuilder::new(
		"SELECT tn_id, code, name, active, created_at FROM tenants WHERE 1=1",
	);
	if let ScopeFilter::Tenant(tn_id) = scope {
		query.push(" AND tn_id = ").push_bind(tn_id.0);
	}
	if let Some(q) = opts.q {
		let pattern = format!("%{}%", q);
		query.push(" AND (code LIKE ").push_bind(pattern.clone());
		query.push(" OR name LIKE ").push_bind(pattern);
		query.push(")");
	}
	if let Some(active) = opts.active {
		query.push(" AND active = ").push_bind(active);
	}
	query.push(" ORDER BY tn_id");
	if let Some(limit) = opts.limit {
		query.push(" LIMIT ").push_bind(limit);
		if let Some(offset) = opts.offset {
			query.push(" OFFSET ").push_bind(offset);
		}
	}

	let rows =
		query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.into_iter().map(tenant_from_row))
}

pub(crate) async fn create_tenant(
	db: &SqlitePool,
	data: &CreateTenantData<'_>,
) -> ClResult<Tenant> {
	let res = sqlx::query(
		"INSERT INTO tenants (code, name, active, created_at) VALUES (?1, ?2, 1, ?3)
		RETURNING tn_id, code, name, active, created_at",
	)
	.bind(data.code)
	.bind(data.name)
	.bind(now().0)
	.fetch_one(db)
	.await;

	map_res(res, tenant_from_row)
}

pub(crate) async fn update_tenant_active(
	db: &SqlitePool,
	tn_id: TnId,
	active: bool,
) -> ClResult<()> {
	let res = sqlx::query("UPDATE tenants SET active = ?1 WHERE tn_id = ?2")
		.bind(active)
		.bind(tn_id.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 { Err(Error::NotFound) } else { Ok(()) }
}

// vim: ts=4
