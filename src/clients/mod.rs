pub mod local_store;
pub mod store;
pub mod supabase_client;
pub mod tutor_client;

pub use local_store::{LocalAuth, LocalStore};
pub use store::{AuthProvider, ProfileStore};
pub use supabase_client::SupabaseClient;
pub use tutor_client::{TutorApi, TutorClient};
