//! Domain model (IDs, options, records, rules, ...).
//!
//! 副作用を持たない層。時刻は引数で受け取り、永続化やタイマーは ports 側に置く。

pub mod ids;
pub mod option;
pub mod item;
pub mod rules;
pub mod remaining;
pub mod state;
pub mod events;

pub use ids::{ItemId, SourceRef, WindowId};
pub use option::DeferralOption;
pub use item::{DeferredItem, Deferral, TabPayload, INDEFINITE_WAKE_MS, indefinite_sentinel};
pub use rules::resolve;
pub use remaining::{TimeRemaining, format_wake_time, remaining, time_remaining};
pub use state::ItemState;
pub use events::DomainEvent;
