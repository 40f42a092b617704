/// Database models
///
/// Each model owns its table's queries as associated `async fn`s taking a
/// `&PgPool`. Contact and plan queries always take the owning `user_id`.
///
/// # Models
///
/// - `user`: accounts (email/password and OAuth)
/// - `contact`: the user's people, with pinned/regular partitions
/// - `plan`: calendar appointments
/// - `place`: keyword search results stored inside plans
/// - `auth_token`: single-use confirmation and recovery tokens
///
/// # Example
///
/// ```no_run
/// use inyeon_shared::models::contact::{Contact, DEFAULT_PAGE_LIMIT};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let pinned = Contact::list_pinned(&pool, user_id).await?;
/// let first_page = Contact::list_regular(&pool, user_id, 0, DEFAULT_PAGE_LIMIT).await?;
/// println!("{} pinned, more: {:?}", pinned.len(), first_page.next_page);
/// # Ok(())
/// # }
/// ```

pub mod auth_token;
pub mod contact;
pub mod place;
pub mod plan;
pub mod user;
