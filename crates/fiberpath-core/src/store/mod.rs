//! # Project Store
//!
//! Single-owner container for the live project. Views hold a reference to
//! the store, mutate it through its operations and observe it through
//! [`ProjectStore::subscribe`] or an async [`ProjectStore::receiver`].
//!
//! ```rust,ignore
//! use fiberpath_core::store::{EventFilter, ProjectStore};
//! use fiberpath_core::project::LayerType;
//!
//! let mut store = ProjectStore::new();
//! store.subscribe(EventFilter::All, |event| println!("{}", event));
//! let id = store.add_layer(LayerType::Helical);
//! store.set_active_layer_id(Some(id));
//! ```

mod bus;
mod events;
#[allow(clippy::module_inception)]
mod store;

pub use bus::{EventBus, EventFilter, SubscriptionId};
pub use events::{EventCategory, ProjectEvent};
pub use store::ProjectStore;
