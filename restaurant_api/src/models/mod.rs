// restaurant_api/src/models/mod.rs

//! Records held by the order store.

pub mod delivery;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod restaurant;

pub use delivery::{Coordinates, DeliveryInfo, DeliveryStatus, Driver};
pub use menu_item::MenuItem;
pub use order::{Address, CustomerDetails, Order, OrderStatus};
pub use order_item::OrderItem;
pub use restaurant::Restaurant;
