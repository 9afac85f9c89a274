//! Database query functions for the `profiles` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Profile;

/// Insert a profile, or update its admin flag if it already exists.
pub async fn upsert_profile(
    pool: &PgPool,
    id: Uuid,
    email: Option<&str>,
    is_admin: bool,
) -> Result<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (id, email, is_admin) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO UPDATE SET is_admin = EXCLUDED.is_admin, \
             email = COALESCE(EXCLUDED.email, profiles.email) \
         RETURNING *",
    )
    .bind(id)
    .bind(email)
    .bind(is_admin)
    .fetch_one(pool)
    .await
    .context("failed to upsert profile")?;

    Ok(profile)
}

/// Fetch a profile by user ID.
pub async fn get_profile(pool: &PgPool, id: Uuid) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch profile")?;

    Ok(profile)
}

/// Whether the user is an administrator. Users without a profile row are not.
pub async fn is_admin(pool: &PgPool, id: Uuid) -> Result<bool> {
    let flag: Option<bool> = sqlx::query_scalar("SELECT is_admin FROM profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to read admin flag")?;

    Ok(flag.unwrap_or(false))
}
