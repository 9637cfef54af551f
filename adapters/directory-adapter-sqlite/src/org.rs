//! Org chart operations

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::utils::*;
use collegio::{directory_adapter::*, prelude::*};

/// Node types that get a team attached on creation.
const TEAM_NODE_TYPES: &[&str] = &["department", "school", "faculty"];

const NODE_COLS: &str = "node_id, tn_id, node_type, title, role_id, user_id, parent, team_id";

fn node_from_row(row: SqliteRow) -> Result<OrgNode, sqlx::Error> {
	Ok(OrgNode {
		node_id: NodeId(row.try_get("node_id")?),
		tn_id: TnId(row.try_get("tn_id")?),
		node_type: row.try_get("node_type")?,
		title: row.try_get("title")?,
		role_id: row.try_get::<Option<i64>, _>("role_id")?.map(RoleId),
		user_id: row.try_get::<Option<i64>, _>("user_id")?.map(UserId),
		parent: row.try_get::<Option<i64>, _>("parent")?.map(NodeId),
		team_id: row.try_get::<Option<i64>, _>("team_id")?.map(TeamId),
	})
}

pub(crate) async fn create_org_node(
	db: &SqlitePool,
	tn_id: TnId,
	data: &CreateOrgNodeData<'_>,
) -> ClResult<OrgNode> {
	let mut tx = db.begin().await.inspect_err(inspect).or(Err(Error::DbError))?;

	if let Some(parent) = data.parent {
		// The parent must exist in the same tenant
		let res = sqlx::query("SELECT node_id FROM org_nodes WHERE node_id = ?1 AND tn_id = ?2")
			.bind(parent.0)
			.bind(tn_id.0)
			.fetch_one(&mut *tx)
			.await;
		map_res(res, |_| Ok(()))?;
	}

	let res = sqlx::query(&format!(
		"INSERT INTO org_nodes (tn_id, node_type, title, role_id, user_id, parent)
		VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING {}",
		NODE_COLS
	))
	.bind(tn_id.0)
	.bind(data.node_type)
	.bind(data.title)
	.bind(data.role_id.map(|r| r.0))
	.bind(data.user_id.map(|u| u.0))
	.bind(data.parent.map(|p| p.0))
	.fetch_one(&mut *tx)
	.await;
	let mut node = map_res(res, node_from_row)?;

	if TEAM_NODE_TYPES.contains(&data.node_type) {
		let team_id: i64 = {
			let res = sqlx::query(
				"INSERT INTO teams (tn_id, name, node_id) VALUES (?1, ?2, ?3) RETURNING team_id",
			)
			.bind(tn_id.0)
			.bind(data.title)
			.bind(node.node_id.0)
			.fetch_one(&mut *tx)
			.await;
			map_res(res, |row| row.try_get("team_id"))?
		};

		sqlx::query("UPDATE org_nodes SET team_id = ?1 WHERE node_id = ?2")
			.bind(team_id)
			.bind(node.node_id.0)
			.execute(&mut *tx)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;
		node.team_id = Some(TeamId(team_id));
	}

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	Ok(node)
}

pub(crate) async fn read_org_node(
	db: &SqlitePool,
	tn_id: TnId,
	node_id: NodeId,
) -> ClResult<OrgNode> {
	let res = sqlx::query(&format!(
		"SELECT {} FROM org_nodes WHERE node_id = ?1 AND tn_id = ?2",
		NODE_COLS
	))
	.bind(node_id.0)
	.bind(tn_id.0)
	.fetch_one(db)
	.await;

	map_res(res, node_from_row)
}

pub(crate) async fn list_org_nodes(db: &SqlitePool, scope: ScopeFilter) -> ClResult<Vec<OrgNode>> {
	if scope == ScopeFilter::Empty {
		return Ok(vec![]);
	}

	let mut query = sqlx::QueryBuilder::new(format!("SELECT {} FROM org_nodes", NODE_COLS));
	if let ScopeFilter::Tenant(tn_id) = scope {
		query.push(" WHERE tn_id = ").push_bind(tn_id.0);
	}
	query.push(" ORDER BY node_id");

	let rows =
		query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;
	collect_res(rows.into_iter().map(node_from_row))
}

// vim: ts=4
