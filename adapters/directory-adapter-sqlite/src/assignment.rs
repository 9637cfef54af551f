//! Role assignment operations
//!
//! `create_assignment` runs the privilege-escalation guard and the write in
//! one transaction, so the assigner's authority cannot change between the
//! check and the insert.

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::utils::*;
use collegio::{directory_adapter::*, prelude::*, types::now};

const ASSIGNMENT_COLS: &str =
	"assignment_id, tn_id, user_id, role_id, assigned_by, assigned_at, expires_at, is_active";

fn assignment_from_row(row: SqliteRow) -> Result<RoleAssignment, sqlx::Error> {
	Ok(RoleAssignment {
		assignment_id: row.try_get("assignment_id")?,
		tn_id: TnId(row.try_get("tn_id")?),
		user_id: UserId(row.try_get("user_id")?),
		role_id: RoleId(row.try_get("role_id")?),
		assigned_by: row.try_get::<Option<i64>, _>("assigned_by")?.map(UserId),
		assigned_at: Timestamp(row.try_get("assigned_at")?),
		expires_at: row.try_get::<Option<i64>, _>("expires_at")?.map(Timestamp),
		is_active: row.try_get("is_active")?,
	})
}

pub(crate) async fn list_assignments(
	db: &SqlitePool,
	scope: ScopeFilter,
	user_id: Option<UserId>,
) -> ClResult<Vec<RoleAssignment>> {
	if scope == ScopeFilter::Empty {
		return Ok(vec![]);
	}

	let mut query = sqlx::QueryBuilder::new(format!(
		"SELECT {} FROM role_assignments WHERE 1=1",
		ASSIGNMENT_COLS
	));
	if let ScopeFilter::Tenant(tn_id) = scope {
		query.push(" AND tn_id = ").push_bind(tn_id.0);
	}
	if let Some(user_id) = user_id {
		query.push(" AND user_id = ").push_bind(user_id.0);
	}
	query.push(" ORDER BY assignment_id");

	let rows =
		query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.into_iter().map(assignment_from_row))
}

pub(crate) async fn list_active_assignments(
	db: &SqlitePool,
	user_id: UserId,
) -> ClResult<Vec<RoleAssignment>> {
	let rows = sqlx::query(&format!(
		"SELECT {} FROM role_assignments WHERE user_id = ?1 AND is_active = 1",
		ASSIGNMENT_COLS
	))
	.bind(user_id.0)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	collect_res(rows.into_iter().map(assignment_from_row))
}

pub(crate) async fn create_assignment(
	db: &SqlitePool,
	tn_id: TnId,
	data: &CreateAssignmentData,
) -> ClResult<(RoleAssignment, bool)> {
	let at = now();
	let mut tx = db.begin().await.inspect_err(inspect).or(Err(Error::DbError))?;

	let role_level = {
		let res = sqlx::query("SELECT level FROM roles WHERE role_id = ?1")
			.bind(data.role_id.0)
			.fetch_one(&mut *tx)
			.await;
		map_res(res, |row| row.try_get::<i32, _>("level"))?
	};

	if data.enforce_level {
		// Lower level means higher authority. An assigner with no active
		// assignments has no authority at all.
		let assigner_level: Option<i32> = sqlx::query_scalar(
			"SELECT MIN(r.level) FROM role_assignments a
			JOIN roles r ON r.role_id = a.role_id
			WHERE a.user_id = ?1 AND a.tn_id = ?2 AND a.is_active = 1
				AND (a.expires_at IS NULL OR a.expires_at > ?3)",
		)
		.bind(data.assigned_by.0)
		.bind(tn_id.0)
		.bind(at.0)
		.fetch_one(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

		match assigner_level {
			Some(level) if level <= role_level => (),
			_ => return Err(Error::PrivilegeEscalation),
		}
	}

	let existing = sqlx::query(&format!(
		"SELECT {} FROM role_assignments WHERE tn_id = ?1 AND user_id = ?2 AND role_id = ?3",
		ASSIGNMENT_COLS
	))
	.bind(tn_id.0)
	.bind(data.user_id.0)
	.bind(data.role_id.0)
	.fetch_optional(&mut *tx)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	let (assignment, created) = match existing {
		Some(row) => {
			let assignment =
				assignment_from_row(row).inspect_err(inspect).map_err(|_| Error::DbError)?;
			if assignment.is_active {
				(assignment, false)
			} else {
				// Reactivate the dormant row instead of inserting a duplicate
				let res = sqlx::query(&format!(
					"UPDATE role_assignments
					SET is_active = 1, assigned_by = ?1, assigned_at = ?2, expires_at = ?3
					WHERE assignment_id = ?4 RETURNING {}",
					ASSIGNMENT_COLS
				))
				.bind(data.assigned_by.0)
				.bind(at.0)
				.bind(data.expires_at.map(|e| e.0))
				.bind(assignment.assignment_id)
				.fetch_one(&mut *tx)
				.await;
				(map_res(res, assignment_from_row)?, true)
			}
		}
		None => {
			let res = sqlx::query(&format!(
				"INSERT INTO role_assignments
					(tn_id, user_id, role_id, assigned_by, assigned_at, expires_at, is_active)
				VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1) RETURNING {}",
				ASSIGNMENT_COLS
			))
			.bind(tn_id.0)
			.bind(data.user_id.0)
			.bind(data.role_id.0)
			.bind(data.assigned_by.0)
			.bind(at.0)
			.bind(data.expires_at.map(|e| e.0))
			.fetch_one(&mut *tx)
			.await;
			(map_res(res, assignment_from_row)?, true)
		}
	};

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	Ok((assignment, created))
}

pub(crate) async fn deactivate_assignment(
	db: &SqlitePool,
	tn_id: TnId,
	assignment_id: i64,
) -> ClResult<RoleAssignment> {
	let res = sqlx::query(&format!(
		"UPDATE role_assignments SET is_active = 0
		WHERE assignment_id = ?1 AND tn_id = ?2 RETURNING {}",
		ASSIGNMENT_COLS
	))
	.bind(assignment_id)
	.bind(tn_id.0)
	.fetch_one(db)
	.await;

	map_res(res, assignment_from_row)
}

pub(crate) async fn delete_assignment(
	db: &SqlitePool,
	tn_id: TnId,
	assignment_id: i64,
) -> ClResult<RoleAssignment> {
	let res = sqlx::query(&format!(
		"DELETE FROM role_assignments WHERE assignment_id = ?1 AND tn_id = ?2 RETURNING {}",
		ASSIGNMENT_COLS
	))
	.bind(assignment_id)
	.bind(tn_id.0)
	.fetch_one(db)
	.await;

	map_res(res, assignment_from_row)
}

pub(crate) async fn max_role_level(db: &SqlitePool, user_id: UserId) -> ClResult<Option<i32>> {
	let level: Option<i32> = sqlx::query_scalar(
		"SELECT MIN(r.level) FROM role_assignments a
		JOIN roles r ON r.role_id = a.role_id
		WHERE a.user_id = ?1 AND a.is_active = 1
			AND (a.expires_at IS NULL OR a.expires_at > ?2)",
	)
	.bind(user_id.0)
	.bind(now().0)
	.fetch_one(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(level)
}

// vim: ts=4
