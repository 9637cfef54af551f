//! Permission catalog and grant operations

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::utils::*;
use collegio::{directory_adapter::*, prelude::*, types::now};

fn grant_from_row(row: SqliteRow) -> Result<RolePermission, sqlx::Error> {
	let scope: &str = row.try_get("scope")?;
	Ok(RolePermission {
		role_id: RoleId(row.try_get("role_id")?),
		code: row.try_get("code")?,
		can_delegate: row.try_get("can_delegate")?,
		scope: PermScope::parse(scope).ok_or_else(|| decode_err("invalid permission scope"))?,
	})
}

pub(crate) async fn list_permissions(db: &SqlitePool) -> ClResult<Vec<Permission>> {
	let rows = sqlx::query("SELECT code, category FROM permissions ORDER BY code")
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	collect_res(rows.into_iter().map(|row| {
		Ok(Permission { code: row.try_get("code")?, category: row.try_get("category")? })
	}))
}

pub(crate) async fn register_permission(
	db: &SqlitePool,
	code: &str,
	category: &str,
) -> ClResult<()> {
	sqlx::query(
		"INSERT INTO permissions (code, category) VALUES (?1, ?2)
		ON CONFLICT(code) DO UPDATE SET category = excluded.category",
	)
	.bind(code)
	.bind(category)
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(())
}

pub(crate) async fn list_role_permissions(
	db: &SqlitePool,
	role_id: RoleId,
) -> ClResult<Vec<RolePermission>> {
	let rows = sqlx::query(
		"SELECT role_id, code, can_delegate, scope FROM role_permissions WHERE role_id = ?1",
	)
	.bind(role_id.0)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	collect_res(rows.into_iter().map(grant_from_row))
}

pub(crate) async fn grant_permission(
	db: &SqlitePool,
	role_id: RoleId,
	code: &str,
	can_delegate: bool,
	scope: PermScope,
) -> ClResult<()> {
	sqlx::query(
		"INSERT INTO role_permissions (role_id, code, can_delegate, scope) VALUES (?1, ?2, ?3, ?4)
		ON CONFLICT(role_id, code) DO UPDATE
		SET can_delegate = excluded.can_delegate, scope = excluded.scope",
	)
	.bind(role_id.0)
	.bind(code)
	.bind(can_delegate)
	.bind(scope.as_str())
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(())
}

pub(crate) async fn revoke_permission(db: &SqlitePool, role_id: RoleId, code: &str) -> ClResult<()> {
	let res = sqlx::query("DELETE FROM role_permissions WHERE role_id = ?1 AND code = ?2")
		.bind(role_id.0)
		.bind(code)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 { Err(Error::NotFound) } else { Ok(()) }
}

/// Distinct holders of active, unexpired assignments of the role. A global
/// role may be held in many tenants; the scope filter keeps propagation from
/// seeing holders outside the tenant it is materializing for.
pub(crate) async fn list_users_with_role(
	db: &SqlitePool,
	scope: ScopeFilter,
	role_id: RoleId,
) -> ClResult<Vec<UserId>> {
	if scope == ScopeFilter::Empty {
		return Ok(vec![]);
	}

	let mut query = sqlx::QueryBuilder::new(
		"SELECT DISTINCT user_id FROM role_assignments WHERE is_active = 1 AND role_id = ",
	);
	query.push_bind(role_id.0);
	if let ScopeFilter::Tenant(tn_id) = scope {
		query.push(" AND tn_id = ").push_bind(tn_id.0);
	}
	query.push(" AND (expires_at IS NULL OR expires_at > ").push_bind(now().0);
	query.push(")");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.into_iter().map(|row| row.try_get("user_id").map(UserId)))
}

// vim: ts=4
