//! Team membership operations

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::utils::*;
use collegio::{directory_adapter::*, prelude::*};

const MEMBERSHIP_COLS: &str =
	"membership_id, tn_id, team_id, leader, member, resource, relationship_type, auto_assigned, reason";

fn membership_from_row(row: SqliteRow) -> Result<TeamMembership, sqlx::Error> {
	Ok(TeamMembership {
		membership_id: row.try_get("membership_id")?,
		tn_id: TnId(row.try_get("tn_id")?),
		team_id: row.try_get::<Option<i64>, _>("team_id")?.map(TeamId),
		leader: UserId(row.try_get("leader")?),
		member: UserId(row.try_get("member")?),
		resource: row.try_get("resource")?,
		relationship_type: row.try_get("relationship_type")?,
		auto_assigned: row.try_get("auto_assigned")?,
		reason: row.try_get("reason")?,
	})
}

/// INSERT OR IGNORE against the (tn_id, leader, member, resource,
/// relationship_type) uniqueness constraint. `false` means the row already
/// existed.
pub(crate) async fn create_team_membership(
	db: &SqlitePool,
	tn_id: TnId,
	data: &CreateTeamMembershipData<'_>,
) -> ClResult<bool> {
	let res = sqlx::query(
		"INSERT OR IGNORE INTO team_memberships
			(tn_id, team_id, leader, member, resource, relationship_type, auto_assigned, reason)
		VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
	)
	.bind(tn_id.0)
	.bind(data.team_id.map(|t| t.0))
	.bind(data.leader.0)
	.bind(data.member.0)
	.bind(data.resource)
	.bind(data.relationship_type)
	.bind(data.auto_assigned)
	.bind(data.reason)
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	Ok(res.rows_affected() > 0)
}

/// Removes only auto-assigned rows with the hierarchy relationship type.
/// Manually created memberships never match.
pub(crate) async fn delete_hierarchy_memberships(
	db: &SqlitePool,
	tn_id: TnId,
	leader: Option<UserId>,
	member: Option<UserId>,
) -> ClResult<u32> {
	let mut query = sqlx::QueryBuilder::new(
		"DELETE FROM team_memberships WHERE auto_assigned = 1 AND relationship_type = ",
	);
	query.push_bind(HIERARCHY_RELATIONSHIP);
	query.push(" AND tn_id = ").push_bind(tn_id.0);
	if let Some(leader) = leader {
		query.push(" AND leader = ").push_bind(leader.0);
	}
	if let Some(member) = member {
		query.push(" AND member = ").push_bind(member.0);
	}

	let res =
		query.build().execute(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	Ok(res.rows_affected() as u32)
}

pub(crate) async fn list_team_memberships(
	db: &SqlitePool,
	scope: ScopeFilter,
	opts: &ListTeamMembershipOptions,
) -> ClResult<Vec<TeamMembership>> {
	if scope == ScopeFilter::Empty {
		return Ok(vec![]);
	}

	let mut query = sqlx::QueryBuilder::new(format!(
		"SELECT {} FROM team_memberships WHERE 1=1",
		MEMBERSHIP_COLS
	));
	if let ScopeFilter::Tenant(tn_id) = scope {
		query.push(" AND tn_id = ").push_bind(tn_id.0);
	}
	if let Some(leader) = opts.leader {
		query.push(" AND leader = ").push_bind(leader.0);
	}
	if let Some(member) = opts.member {
		query.push(" AND member = ").push_bind(member.0);
	}
	if let Some(ref resource) = opts.resource {
		query.push(" AND resource = ").push_bind(resource.to_string());
	}
	if let Some(auto_assigned) = opts.auto_assigned {
		query.push(" AND auto_assigned = ").push_bind(auto_assigned);
	}
	query.push(" ORDER BY membership_id");

	let rows =
		query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.into_iter().map(membership_from_row))
}

// vim: ts=4
