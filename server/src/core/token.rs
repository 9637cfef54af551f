//! Access token handling.

const TOKEN_EXPIRE: u64 = 8; /* hours */

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time;

use crate::prelude::*;
use crate::types::AuthCtx;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccessToken<S> {
	/// Principal id
	pub sub: i64,
	/// Tenant id
	pub tn: u32,
	/// Comma-joined role names
	pub r: Option<S>,
	pub exp: u64,
}

pub fn generate_access_token(
	secret: &str,
	user_id: UserId,
	tn_id: TnId,
	roles: Option<&str>,
) -> ClResult<Box<str>> {
	let expire = time::SystemTime::now()
		.duration_since(time::UNIX_EPOCH)
		.map_err(|_| Error::PermissionDenied)?
		.as_secs() + 3600 * TOKEN_EXPIRE;

	let token = encode(
		&jsonwebtoken::Header::new(Algorithm::HS256),
		&AccessToken::<&str> { sub: user_id.0, tn: tn_id.0, r: roles, exp: expire },
		&EncodingKey::from_secret(secret.as_bytes()),
	)
	.map_err(|_| Error::PermissionDenied)?
	.into();

	Ok(token)
}

pub fn validate_access_token(secret: &str, token: &str) -> ClResult<AuthCtx> {
	let decoding_key = DecodingKey::from_secret(secret.as_bytes());

	let token_data = decode::<AccessToken<Box<str>>>(
		token,
		&decoding_key,
		&Validation::new(Algorithm::HS256),
	)
	.map_err(|_| Error::PermissionDenied)?;

	Ok(AuthCtx {
		user_id: UserId(token_data.claims.sub),
		tn_id: TnId(token_data.claims.tn),
		roles: token_data
			.claims
			.r
			.as_deref()
			.unwrap_or("")
			.split(',')
			.filter(|r| !r.is_empty())
			.map(Box::from)
			.collect(),
	})
}


// vim: ts=4
