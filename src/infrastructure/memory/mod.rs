//! Memory Layer - In-Memory State Management
//!
//! 偏好设置的内存实现，用于测试和临时运行

mod preference_store;

pub use preference_store::InMemoryPreferenceStore;
