//! User-facing message texts.

use intake_types::{Order, OrderId, OrderStatus};

pub const WELCOME: &str = "Добро пожаловать! Нажмите кнопку ниже, чтобы начать.";
pub const MAIN_MENU: &str = "Выберите действие из меню:";
pub const SERVICES: &str = "Выберите услугу:";
pub const EDIT_MENU: &str = "Выберите, что вы хотите изменить:";
pub const CANCELLED: &str = "Действие отменено.";

pub const COMPUTER_HELP: &str = "Мы предлагаем:\n\
	— Полный аутсорсинг для ИП, ТОО и любых других форм бизнеса.\n\
	— Установка любых программ, необходимых для работы.\n\
	— Удалённая настройка через TeamViewer, AnyDesk, Ammyy Admin — быстро и удобно.\n\n\
	Комплексные услуги для вашей техники:\n\
	— Установка Windows (10, 11, Server) и Office (2007–2021+).\n\
	— Настройка драйверов для стабильной работы.\n\
	— Профессиональная чистка ноутбуков и ПК.\n\
	— Оптимизация систем для максимальной производительности.";

pub const INSTALLATION: &str = "Устали от медленного интернета, обрывов соединения и хаоса с проводами?\n\
	Мы предлагаем профессиональный монтаж локальных сетей \"под ключ\" для вашего дома, офиса или предприятия!\n\n\
	Почему выбирают нас?\n\
	Высокая скорость и стабильность: Мы проектируем и настраиваем сети, которые работают без перебоев.\n\
	Индивидуальный подход: Решения, идеально подходящие под ваши задачи и бюджет.\n\
	Современные технологии: Используем только проверенные материалы и оборудование.\n\
	Квалифицированные специалисты: У нас работают опытные инженеры с более чем 5-летним опытом.\n\
	Гарантия качества: Даем гарантию на все выполненные работы и материалы.\n\n\
	Мы предлагаем:\n\
	Проектирование сети: Разработка схем подключения с учётом ваших потребностей.\n\
	Монтаж и настройка: Установка кабельной системы, Wi-Fi точек, маршрутизаторов и другого оборудования.\n\
	Техническая поддержка: Обслуживание сетей и оперативное решение любых вопросов.";

// Order form prompts
pub const ASK_FULL_NAME_VISIT: &str = "Пожалуйста, введите ваше полное имя для оформления заявки:";
pub const ASK_FULL_NAME: &str = "Пожалуйста, введите ваше полное имя:";
pub const ASK_ADDRESS: &str = "Введите ваш адрес:";
pub const ASK_PHONE: &str = "Введите ваш номер телефона:";
pub const ASK_REASON: &str = "Введите причину обращения:";
pub const ASK_NEW_NAME: &str = "Введите новое имя:";
pub const ASK_NEW_ADDRESS: &str = "Введите новый адрес:";
pub const ASK_NEW_PHONE: &str = "Введите новый номер телефона:";
pub const ORDER_FAILED: &str = "Не удалось оформить заявку. Попробуйте позже.";

// Status lookup
pub const ASK_REQUEST_ID: &str = "Пожалуйста, введите номер вашей заявки (ID):";
pub const INVALID_ID: &str = "Неверный формат ID. Пожалуйста, введите число ID.";
pub const STATUS_FAILED: &str = "Не удалось получить статус заявки. Попробуйте позже.";

// Admin
pub const ADMIN_PANEL: &str = "Панель администратора:\nВведите номер заявки (ID):";
pub const ACCESS_DENIED: &str = "Доступ запрещён.";
pub const MALFORMED_ACTION: &str = "Ошибка при извлечении ID заявки. Повторите попытку.";

pub fn order_confirmation(order: &Order) -> String {
	format!(
		"Заявка #{} успешно оформлена!\nИмя: {}\nАдрес: {}\nТелефон: {}\nПричина обращения: {}",
		order.id, order.full_name, order.address, order.phone_number, order.reason
	)
}

/// Order details shown to the administrator above the action menu.
pub fn order_card(order: &Order) -> String {
	format!(
		"Заявка #{}\nИмя: {}\nАдрес: {}\nТелефон: {}\nПричина обращения: {}\nСтатус: {}",
		order.id, order.full_name, order.address, order.phone_number, order.reason, order.status
	)
}

pub fn new_order_notice(order: &Order) -> String {
	format!("Новая заявка!\n{}", order_card(order))
}

pub fn status_changed(id: OrderId, status: OrderStatus) -> String {
	format!("Заявка {} теперь имеет статус: {}", id, status)
}

pub fn status_change_failed(id: OrderId) -> String {
	format!(
		"Не удалось обновить статус заявки с ID {}. Попробуйте позже.",
		id
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_confirmation_echoes_fields() {
		let order = Order {
			id: OrderId(4),
			full_name: "Ivan Petrov".into(),
			address: "123 Main St".into(),
			phone_number: "+1000".into(),
			reason: "broken router".into(),
			status: OrderStatus::Pending,
		};
		assert_eq!(
			order_confirmation(&order),
			"Заявка #4 успешно оформлена!\nИмя: Ivan Petrov\nАдрес: 123 Main St\nТелефон: +1000\nПричина обращения: broken router"
		);
		assert!(order_card(&order).ends_with("Статус: Ожидает обработки"));
	}

	#[test]
	fn test_service_texts_keep_line_breaks() {
		assert!(COMPUTER_HELP.starts_with("Мы предлагаем:\n— Полный"));
		assert!(INSTALLATION.contains("\n\nПочему выбирают нас?\nВысокая"));
	}
}
