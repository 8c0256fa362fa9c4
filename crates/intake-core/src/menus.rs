//! Menus and the selection keys they report.
//!
//! Every button carries a selection key. Static keys name a navigation step
//! or flow entry point. Admin action keys embed the target order id as
//! `processed:{id}` or `in_progress:{id}`.

use crate::input::parse_order_id;
use intake_types::{Button, Menu, OrderId, OrderStatus};
use std::str::FromStr;
use thiserror::Error;

const PROCESSED_PREFIX: &str = "processed:";
const IN_PROGRESS_PREFIX: &str = "in_progress:";

/// A decoded selection key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
	StartWork,
	Services,
	ComputerHelp,
	Installation,
	OrderVisit,
	ApplyRequest,
	StatusRequest,
	EditRequest,
	EditName,
	EditAddress,
	EditPhone,
	BackToMain,
	AdminPanel,
	MarkProcessed(OrderId),
	MarkInProgress(OrderId),
}

/// Errors that can occur while decoding a selection key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionParseError {
	#[error("Unknown selection key: {0}")]
	Unknown(String),
	/// An admin action key whose id part is not a number.
	#[error("Malformed order id in selection key: {0}")]
	MalformedId(String),
}

impl Action {
	/// The selection key reported when the button is pressed.
	pub fn key(&self) -> String {
		match self {
			Action::StartWork => "start_work".into(),
			Action::Services => "services".into(),
			Action::ComputerHelp => "service_1".into(),
			Action::Installation => "service_2".into(),
			Action::OrderVisit => "service_3".into(),
			Action::ApplyRequest => "apply_request".into(),
			Action::StatusRequest => "status_request".into(),
			Action::EditRequest => "edit_request".into(),
			Action::EditName => "edit_name".into(),
			Action::EditAddress => "edit_address".into(),
			Action::EditPhone => "edit_phone".into(),
			Action::BackToMain => "back_to_main".into(),
			Action::AdminPanel => "admin_panel".into(),
			Action::MarkProcessed(id) => format!("{}{}", PROCESSED_PREFIX, id),
			Action::MarkInProgress(id) => format!("{}{}", IN_PROGRESS_PREFIX, id),
		}
	}

	/// Target status of an admin action.
	pub fn target_status(&self) -> Option<(OrderId, OrderStatus)> {
		match self {
			Action::MarkProcessed(id) => Some((*id, OrderStatus::Processed)),
			Action::MarkInProgress(id) => Some((*id, OrderStatus::InProgress)),
			_ => None,
		}
	}

	fn button(self, label: &str) -> Button {
		Button::new(label, self.key())
	}
}

impl FromStr for Action {
	type Err = ActionParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let action = match s {
			"start_work" => Action::StartWork,
			"services" => Action::Services,
			"service_1" => Action::ComputerHelp,
			"service_2" => Action::Installation,
			"service_3" => Action::OrderVisit,
			"apply_request" => Action::ApplyRequest,
			"status_request" => Action::StatusRequest,
			"edit_request" => Action::EditRequest,
			"edit_name" => Action::EditName,
			"edit_address" => Action::EditAddress,
			"edit_phone" => Action::EditPhone,
			"back_to_main" => Action::BackToMain,
			"admin_panel" => Action::AdminPanel,
			_ => {
				if let Some(id) = s.strip_prefix(PROCESSED_PREFIX) {
					Action::MarkProcessed(embedded_id(s, id)?)
				} else if let Some(id) = s.strip_prefix(IN_PROGRESS_PREFIX) {
					Action::MarkInProgress(embedded_id(s, id)?)
				} else {
					return Err(ActionParseError::Unknown(s.to_string()));
				}
			},
		};
		Ok(action)
	}
}

fn embedded_id(key: &str, id: &str) -> Result<OrderId, ActionParseError> {
	parse_order_id(id).map_err(|_| ActionParseError::MalformedId(key.to_string()))
}

pub fn start_menu() -> Menu {
	Menu::column([Action::StartWork.button("🚀 Старт")])
}

pub fn main_menu() -> Menu {
	Menu::column([
		Action::Services.button("📋 Услуги"),
		Action::ApplyRequest.button("📝 Оформить заявку"),
		Action::StatusRequest.button("📦 Статус заявки"),
		Action::EditRequest.button("✏️ Редактировать заявку"),
		Action::AdminPanel.button("🔧 Панель администратора"),
	])
}

pub fn services_menu() -> Menu {
	Menu::column([
		Action::ComputerHelp.button("Компьютерная помощь"),
		Action::Installation.button("Предложения по монтажным работам"),
		Action::OrderVisit.button("Заказ на выезд"),
		Action::BackToMain.button("⬅️ Назад"),
	])
}

pub fn edit_menu() -> Menu {
	Menu::column([
		Action::EditName.button("Редактировать имя"),
		Action::EditAddress.button("Редактировать адрес"),
		Action::EditPhone.button("Редактировать телефон"),
		Action::BackToMain.button("⬅️ Назад"),
	])
}

/// Status actions for one order.
pub fn order_actions_menu(id: OrderId) -> Menu {
	Menu::column([
		Action::MarkProcessed(id).button(OrderStatus::Processed.label()),
		Action::MarkInProgress(id).button(OrderStatus::InProgress.label()),
		Action::BackToMain.button("⬅️ Назад"),
	])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_every_menu_key_parses_back() {
		let menus = [
			start_menu(),
			main_menu(),
			services_menu(),
			edit_menu(),
			order_actions_menu(OrderId(12)),
		];
		for menu in &menus {
			for button in menu.buttons() {
				let action: Action = button.key.parse().unwrap();
				assert_eq!(action.key(), button.key);
			}
		}
	}

	#[test]
	fn test_admin_keys_embed_order_id() {
		let keys: Vec<String> = order_actions_menu(OrderId(12))
			.buttons()
			.map(|b| b.key.clone())
			.collect();
		assert_eq!(keys, ["processed:12", "in_progress:12", "back_to_main"]);

		assert_eq!(
			"in_progress:5".parse::<Action>().unwrap().target_status(),
			Some((OrderId(5), OrderStatus::InProgress))
		);
		assert_eq!(Action::Services.target_status(), None);
	}

	#[test]
	fn test_bad_keys() {
		assert_eq!(
			"processed:abc".parse::<Action>(),
			Err(ActionParseError::MalformedId("processed:abc".into()))
		);
		assert_eq!(
			"in_progress:".parse::<Action>(),
			Err(ActionParseError::MalformedId("in_progress:".into()))
		);
		assert_eq!(
			"processed_1".parse::<Action>(),
			Err(ActionParseError::Unknown("processed_1".into()))
		);
	}
}
