use once_cell::sync::Lazy;

use crate::models::{ProductOption, SourceOption};
use crate::store::{DatePreset, PresetRange};

/// 后端不可用时展示的评论来源。
pub static FALLBACK_SOURCES: Lazy<Vec<SourceOption>> = Lazy::new(|| {
    [
        ("app-store", "App Store"),
        ("google-play", "Google Play"),
        ("banki-ru", "Banki.ru"),
        ("irecommend", "iRecommend"),
        ("social-vk", "ВКонтакте"),
        ("social-telegram", "Telegram"),
        ("reviews-site", "Сайт отзывов"),
    ]
    .into_iter()
    .map(|(value, label)| SourceOption {
        value: value.to_string(),
        label: label.to_string(),
    })
    .collect()
});

pub static FALLBACK_PRODUCTS: Lazy<Vec<ProductOption>> = Lazy::new(|| {
    [
        ("credit-cards", "Кредитные карты", "Карты"),
        ("debit-cards", "Дебетовые карты", "Карты"),
        ("mortgage", "Ипотека", "Кредиты"),
        ("auto-loan", "Автокредит", "Кредиты"),
        ("consumer-loan", "Потребительский кредит", "Кредиты"),
        ("deposits", "Вклады", "Депозиты"),
        ("savings", "Накопительные счета", "Депозиты"),
        ("mobile-app", "Мобильное приложение", "Сервисы"),
        ("online-banking", "Интернет-банк", "Сервисы"),
        ("support", "Служба поддержки", "Сервисы"),
    ]
    .into_iter()
    .map(|(value, label, category)| ProductOption {
        value: value.to_string(),
        label: label.to_string(),
        category: category.to_string(),
    })
    .collect()
});

pub static BUILTIN_DATE_PRESETS: Lazy<Vec<DatePreset>> = Lazy::new(|| {
    vec![
        DatePreset::new("Последние 7 дней", "week", PresetRange::LastDays(7)),
        DatePreset::new("Последние 30 дней", "month", PresetRange::LastDays(30)),
        DatePreset::new("Текущий месяц", "current-month", PresetRange::CurrentMonth),
        DatePreset::new("Текущий квартал", "quarter", PresetRange::CurrentQuarter),
    ]
});
