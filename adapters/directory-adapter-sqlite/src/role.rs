//! Role tree operations

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::utils::*;
use collegio::{directory_adapter::*, prelude::*};

fn role_from_row(row: SqliteRow) -> Result<Role, sqlx::Error> {
	Ok(Role {
		role_id: RoleId(row.try_get("role_id")?),
		tn_id: row.try_get::<Option<u32>, _>("tn_id")?.map(TnId),
		name: row.try_get("name")?,
		level: row.try_get("level")?,
		parent: row.try_get::<Option<i64>, _>("parent")?.map(RoleId),
	})
}

pub(crate) async fn read_role(db: &SqlitePool, role_id: RoleId) -> ClResult<Role> {
	let res = sqlx::query("SELECT role_id, tn_id, name, level, parent FROM roles WHERE role_id = ?1")
		.bind(role_id.0)
		.fetch_one(db)
		.await;

	map_res(res, role_from_row)
}

pub(crate) async fn list_roles(db: &SqlitePool, scope: ScopeFilter) -> ClResult<Vec<Role>> {
	if scope == ScopeFilter::Empty {
		return Ok(vec![]);
	}

	let mut query =
		sqlx::QueryBuilder::new("SELECT role_id, tn_id, name, level, parent FROM roles");
	if let ScopeFilter::Tenant(tn_id) = scope {
		// Tenant roles plus global roles
		query.push(" WHERE tn_id = ").push_bind(tn_id.0);
		query.push(" OR tn_id IS NULL");
	}
	query.push(" ORDER BY level, role_id");

	let rows =
		query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.into_iter().map(role_from_row))
}

pub(crate) async fn create_role(
	db: &SqlitePool,
	tn_id: TnId,
	data: &CreateRoleData<'_>,
) -> ClResult<Role> {
	let res = sqlx::query(
		"INSERT INTO roles (tn_id, name, level, parent) VALUES (?1, ?2, ?3, ?4)
		RETURNING role_id, tn_id, name, level, parent",
	)
	.bind(tn_id.0)
	.bind(data.name)
	.bind(data.level)
	.bind(data.parent.map(|p| p.0))
	.fetch_one(db)
	.await;

	map_res(res, role_from_row)
}

pub(crate) async fn delete_role(db: &SqlitePool, tn_id: TnId, role_id: RoleId) -> ClResult<()> {
	let mut tx = db.begin().await.inspect_err(inspect).or(Err(Error::DbError))?;

	let res = sqlx::query("DELETE FROM roles WHERE role_id = ?1 AND tn_id = ?2")
		.bind(role_id.0)
		.bind(tn_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	sqlx::query("DELETE FROM role_permissions WHERE role_id = ?1")
		.bind(role_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	Ok(())
}

// vim: ts=4
