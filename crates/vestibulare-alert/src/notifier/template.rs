//! Message context and pt-BR rendering helpers.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use vestibulare_entity::subscription::Channel;

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Everything a notifier needs to render one reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateContext {
    /// Recipient's first name, or the neutral fallback.
    pub user_name: String,
    /// Exam program name.
    pub program_name: String,
    /// Event label.
    pub event_label: String,
    /// Long pt-BR date, e.g. `08 de novembro de 2026`.
    pub formatted_date: String,
    /// `HOJE`, `AMANHÃ`, `em N dias`, or `encerrado há N dias`.
    pub urgency_text: String,
    /// Official page, from the event or else the program.
    pub official_url: Option<String>,
}

/// A rendered message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    /// Subject line; e-mail only.
    pub subject: Option<String>,
    /// Plain-text body.
    pub body: String,
}

/// `dd de <mês> de yyyy`.
pub fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{:02} de {} de {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// Human urgency for an event `days_until` days away.
pub fn urgency_text(days_until: i64) -> String {
    match days_until {
        0 => "HOJE".to_string(),
        1 => "AMANHÃ".to_string(),
        -1 => "encerrado há 1 dia".to_string(),
        d if d < 0 => format!("encerrado há {} dias", -d),
        d => format!("em {d} dias"),
    }
}

/// Render `context` for `channel`.
pub fn render(channel: Channel, context: &TemplateContext) -> RenderedMessage {
    let link = context
        .official_url
        .as_deref()
        .map(|url| format!(" {url}"))
        .unwrap_or_default();

    match channel {
        Channel::Email => RenderedMessage {
            subject: Some(format!(
                "⚠️ {}: {} {}!",
                context.program_name, context.event_label, context.urgency_text
            )),
            body: format!(
                "Olá, {}!\n\n{}\n📅 {}\n⏰ {}\n{}\nVocê recebeu este email porque ativou alertas para {} no VestibulaRe.",
                context.user_name,
                context.event_label,
                context.formatted_date,
                context.urgency_text,
                context
                    .official_url
                    .as_deref()
                    .map(|url| format!("\nSite oficial: {url}\n"))
                    .unwrap_or_default(),
                context.program_name,
            ),
        },
        Channel::Sms => RenderedMessage {
            subject: None,
            body: format!(
                "VestibulaRe: {} - {} {} ({}).{}",
                context.program_name,
                context.event_label,
                context.urgency_text,
                context.formatted_date,
                link
            ),
        },
        Channel::Whatsapp => RenderedMessage {
            subject: None,
            body: format!(
                "Olá, {}! 🎓 {}: {} {} ({}).{}",
                context.user_name,
                context.program_name,
                context.event_label,
                context.urgency_text,
                context.formatted_date,
                link
            ),
        },
    }
}
