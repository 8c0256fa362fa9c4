//! Order store.
//!
//! Keeps every order in one collection persisted through the storage
//! service. Each operation loads the whole collection and, when it changes
//! anything, rewrites it as a whole. A single lock serializes the
//! load/modify/save cycles of this process.

use intake_storage::{StorageError, StorageService};
use intake_types::{Order, OrderDraft, OrderId, OrderStatus, StorageKey};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Answer of a status lookup for an id that does not exist.
pub const NOT_FOUND_TEXT: &str = "Заявка не найдена";

/// Errors that can occur during order store operations.
#[derive(Debug, Error)]
pub enum OrderStoreError {
	/// The persisted collection could not be decoded.
	#[error("Order store is corrupt: {0}")]
	StoreCorrupt(String),
	/// The persisted data is not a list of orders.
	#[error("Order store is unavailable: {0}")]
	StoreUnavailable(String),
	#[error("Order not found: {0}")]
	OrderNotFound(OrderId),
	/// The order is already settled.
	#[error("Order {id} is already {status}")]
	InvalidTransition { id: OrderId, status: OrderStatus },
	#[error("Storage error: {0}")]
	Storage(String),
}

/// Persistent collection of all orders.
pub struct OrderStore {
	storage: Arc<StorageService>,
	lock: Mutex<()>,
}

impl OrderStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			lock: Mutex::new(()),
		}
	}

	/// Reads the full collection.
	///
	/// A collection that was never written is empty. Undecodable content is
	/// reported as an error, never replaced with placeholder records.
	pub async fn load(&self) -> Result<Vec<Order>, OrderStoreError> {
		let value: serde_json::Value = match self.storage.retrieve(StorageKey::Orders).await {
			Ok(value) => value,
			Err(StorageError::NotFound) => {
				tracing::warn!("Order store not found, starting with an empty collection");
				return Ok(Vec::new());
			},
			Err(StorageError::Serialization(e)) => {
				tracing::error!(error = %e, "Order store is not valid JSON");
				return Err(OrderStoreError::StoreCorrupt(e));
			},
			Err(e) => return Err(OrderStoreError::Storage(e.to_string())),
		};

		if !value.is_array() {
			tracing::error!("Order store does not hold a list");
			return Err(OrderStoreError::StoreUnavailable(
				"expected a JSON array of orders".into(),
			));
		}

		serde_json::from_value(value).map_err(|e| {
			tracing::error!(error = %e, "Order store holds malformed records");
			OrderStoreError::StoreCorrupt(e.to_string())
		})
	}

	/// Overwrites the full collection.
	pub async fn save(&self, orders: &[Order]) -> Result<(), OrderStoreError> {
		self.storage
			.store(StorageKey::Orders, orders)
			.await
			.map_err(|e| OrderStoreError::Storage(e.to_string()))
	}

	/// Appends a new `Pending` order built from the draft and returns its id.
	pub async fn append_order(&self, draft: OrderDraft) -> Result<OrderId, OrderStoreError> {
		let _guard = self.lock.lock().await;

		let mut orders = self.load().await?;
		let id = next_id(&orders)?;
		orders.push(draft.into_order(id));
		self.save(&orders).await?;

		tracing::info!(order_id = %id, total = orders.len(), "Order created");
		Ok(id)
	}

	/// Returns `"{reason}\n{status}"` for the order, or [`NOT_FOUND_TEXT`].
	pub async fn get_status_text(&self, id: OrderId) -> Result<String, OrderStoreError> {
		let orders = self.load().await?;
		Ok(orders
			.iter()
			.find(|o| o.id == id)
			.map(Order::status_text)
			.unwrap_or_else(|| NOT_FOUND_TEXT.to_string()))
	}

	/// Returns a single order.
	pub async fn get_order(&self, id: OrderId) -> Result<Order, OrderStoreError> {
		self.load()
			.await?
			.into_iter()
			.find(|o| o.id == id)
			.ok_or(OrderStoreError::OrderNotFound(id))
	}

	/// Moves an unsettled order to `new_status` and returns the updated order.
	///
	/// The stored collection is untouched when the order is missing or settled.
	pub async fn update_status(
		&self,
		id: OrderId,
		new_status: OrderStatus,
	) -> Result<Order, OrderStoreError> {
		let _guard = self.lock.lock().await;

		let mut orders = self.load().await?;
		let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
			tracing::warn!(order_id = %id, "Order not found");
			return Err(OrderStoreError::OrderNotFound(id));
		};

		if order.status.is_settled() {
			tracing::info!(order_id = %id, status = %order.status, "Order already settled, no change needed");
			return Err(OrderStoreError::InvalidTransition {
				id,
				status: order.status,
			});
		}

		let from = order.status;
		order.status = new_status;
		let updated = order.clone();
		self.save(&orders).await?;

		tracing::info!(order_id = %id, from = %from, to = %new_status, "Order status updated");
		Ok(updated)
	}

	/// Boolean view of [`update_status`](Self::update_status).
	pub async fn update_status_flag(&self, id: OrderId, new_status: OrderStatus) -> bool {
		match self.update_status(id, new_status).await {
			Ok(_) => true,
			Err(e) => {
				tracing::debug!(order_id = %id, error = %e, "Status update refused");
				false
			},
		}
	}
}

fn next_id(orders: &[Order]) -> Result<OrderId, OrderStoreError> {
	orders
		.iter()
		.map(|o| o.id.0)
		.max()
		.unwrap_or(0)
		.checked_add(1)
		.map(OrderId)
		.ok_or_else(|| OrderStoreError::StoreUnavailable("order id space exhausted".into()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::MockBackend;
	use intake_storage::implementations::memory::MemoryStorage;

	fn memory_store() -> OrderStore {
		OrderStore::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	fn store_with_bytes(bytes: &'static [u8]) -> OrderStore {
		let mut backend = MockBackend::new();
		backend
			.expect_get_bytes()
			.returning(move |_| Ok(bytes.to_vec()));
		backend.expect_set_bytes().never();
		OrderStore::new(Arc::new(StorageService::new(Box::new(backend))))
	}

	fn draft(name: &str, reason: &str) -> OrderDraft {
		OrderDraft {
			full_name: Some(name.into()),
			address: Some("123 Main St".into()),
			phone_number: Some("+1000".into()),
			reason: Some(reason.into()),
		}
	}

	#[tokio::test]
	async fn test_ids_start_at_one_and_increase() {
		let store = memory_store();
		assert!(store.load().await.unwrap().is_empty());

		let first = store.append_order(draft("Ivan", "a")).await.unwrap();
		let second = store.append_order(draft("Petr", "b")).await.unwrap();
		let third = store.append_order(draft("Anna", "c")).await.unwrap();
		assert_eq!((first, second, third), (OrderId(1), OrderId(2), OrderId(3)));

		let orders = store.load().await.unwrap();
		assert!(orders.iter().all(|o| o.status == OrderStatus::Pending));
		assert_eq!(orders[1].full_name, "Petr");
	}

	#[tokio::test]
	async fn test_next_id_follows_max_not_count() {
		let store = memory_store();
		let mut orders = Vec::new();
		for id in [7, 3] {
			orders.push(draft("x", "y").into_order(OrderId(id)));
		}
		store.save(&orders).await.unwrap();

		let id = store.append_order(draft("z", "w")).await.unwrap();
		assert_eq!(id, OrderId(8));
	}

	#[tokio::test]
	async fn test_append_refuses_exhausted_id_space() {
		let store = memory_store();
		let orders = vec![draft("x", "y").into_order(OrderId(u64::MAX))];
		store.save(&orders).await.unwrap();

		let err = store.append_order(draft("z", "w")).await.unwrap_err();
		assert!(matches!(err, OrderStoreError::StoreUnavailable(_)));
		assert_eq!(store.load().await.unwrap(), orders);
	}

	#[tokio::test]
	async fn test_status_text() {
		let store = memory_store();
		let id = store
			.append_order(draft("Ivan Petrov", "broken router"))
			.await
			.unwrap();

		assert_eq!(
			store.get_status_text(id).await.unwrap(),
			"broken router\nОжидает обработки"
		);
		assert_eq!(
			store.get_status_text(OrderId(99)).await.unwrap(),
			NOT_FOUND_TEXT
		);
	}

	#[tokio::test]
	async fn test_update_status_transitions() {
		let store = memory_store();
		let id = store.append_order(draft("Ivan", "a")).await.unwrap();

		let order = store
			.update_status(id, OrderStatus::InProgress)
			.await
			.unwrap();
		assert_eq!(order.status, OrderStatus::InProgress);

		// In progress may still move anywhere
		let order = store
			.update_status(id, OrderStatus::Processed)
			.await
			.unwrap();
		assert_eq!(order.status, OrderStatus::Processed);

		let err = store
			.update_status(id, OrderStatus::InProgress)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			OrderStoreError::InvalidTransition {
				status: OrderStatus::Processed,
				..
			}
		));
		assert_eq!(
			store.get_order(id).await.unwrap().status,
			OrderStatus::Processed
		);

		assert!(matches!(
			store.update_status(OrderId(42), OrderStatus::Processed).await,
			Err(OrderStoreError::OrderNotFound(OrderId(42)))
		));
		assert!(!store.update_status_flag(id, OrderStatus::Pending).await);
	}

	#[tokio::test]
	async fn test_save_load_preserves_records() {
		let store = memory_store();
		for name in ["Анна", "Борис", "Вера"] {
			store.append_order(draft(name, "ремонт")).await.unwrap();
		}
		store
			.update_status(OrderId(2), OrderStatus::InProgress)
			.await
			.unwrap();

		let before = store.load().await.unwrap();
		store.save(&before).await.unwrap();
		assert_eq!(store.load().await.unwrap(), before);
	}

	#[tokio::test]
	async fn test_corrupt_and_non_list_content() {
		let store = store_with_bytes(b"{ not json");
		assert!(matches!(
			store.load().await,
			Err(OrderStoreError::StoreCorrupt(_))
		));
		assert!(matches!(
			store.append_order(draft("a", "b")).await,
			Err(OrderStoreError::StoreCorrupt(_))
		));

		let store = store_with_bytes(br#"{"id": 1}"#);
		assert!(matches!(
			store.append_order(draft("a", "b")).await,
			Err(OrderStoreError::StoreUnavailable(_))
		));

		let store = store_with_bytes(br#"[{"id": 1, "status": "unknown"}]"#);
		assert!(matches!(
			store.get_status_text(OrderId(1)).await,
			Err(OrderStoreError::StoreCorrupt(_))
		));
	}

	#[tokio::test]
	async fn test_backend_failure_is_typed() {
		let mut backend = MockBackend::new();
		backend
			.expect_get_bytes()
			.returning(|_| Err(StorageError::Backend("disk gone".into())));
		let store = OrderStore::new(Arc::new(StorageService::new(Box::new(backend))));

		let err = store
			.update_status(OrderId(1), OrderStatus::Processed)
			.await
			.unwrap_err();
		assert!(matches!(err, OrderStoreError::Storage(msg) if msg.contains("disk gone")));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_appends_get_distinct_ids() {
		let store = Arc::new(memory_store());
		let mut handles = Vec::new();
		for i in 0..20 {
			let store = store.clone();
			handles.push(tokio::spawn(async move {
				store
					.append_order(draft(&format!("user {}", i), "r"))
					.await
					.unwrap()
			}));
		}

		let mut ids = Vec::new();
		for handle in handles {
			ids.push(handle.await.unwrap().0);
		}
		ids.sort_unstable();
		assert_eq!(ids, (1..=20).collect::<Vec<_>>());
		assert_eq!(store.load().await.unwrap().len(), 20);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
	async fn test_concurrent_updates_apply_serially() {
		let store = Arc::new(memory_store());
		let id = store.append_order(draft("Ivan", "a")).await.unwrap();

		// Holding the lock queues both updates in call order.
		let guard = store.lock.lock().await;
		let first = {
			let store = store.clone();
			tokio::spawn(async move { store.update_status(id, OrderStatus::InProgress).await })
		};
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		let second = {
			let store = store.clone();
			tokio::spawn(async move { store.update_status(id, OrderStatus::Pending).await })
		};
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		drop(guard);

		let first = first.await.unwrap().unwrap();
		let second = second.await.unwrap().unwrap();
		assert_eq!(first.status, OrderStatus::InProgress);
		assert_eq!(second.status, OrderStatus::Pending);
		assert_eq!(
			store.get_order(id).await.unwrap().status,
			OrderStatus::Pending
		);
	}
}
