//! Chat store adapters.

mod in_memory;
mod supabase;

pub use in_memory::InMemoryChatStore;
pub use supabase::{SupabaseChatStore, SupabaseConfig};
