//! REST client for the Wastewise API
//!
//! ```rust,no_run
//! use client::{ApiClient, AuthContext};
//!
//! # async fn run() -> client::ClientResult<()> {
//! let api = ApiClient::new("http://localhost:3001")?;
//! let mut context = AuthContext::new();
//! api.login(&mut context, "nimal@example.com", "password123").await?;
//! let credits = api.recycling_credits(&context).await?;
//! println!("{} credits", credits);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod context;
pub mod error;
pub mod models;

pub use api::ApiClient;
pub use context::{AuthContext, AuthState};
pub use error::{ClientError, ClientResult};
