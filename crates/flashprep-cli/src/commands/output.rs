//! Terminal rendering.

use colored::Colorize;
use flashprep_application::{EmptyState, Notification, NotificationLevel, ViewSnapshot};
use flashprep_core::question::CardView;
use flashprep_core::user::User;

pub fn notification(notification: &Notification) {
    match notification.level {
        NotificationLevel::Success => {
            println!("{}", format!("✓ {}", notification.message).green())
        }
        NotificationLevel::Error => {
            eprintln!("{}", format!("✗ {}", notification.message).red())
        }
    }
}

pub fn user(user: &User) {
    println!("{} {}", "Signed in as".bright_cyan(), user.display_name().bold());
    println!("  id:    {}", user.id);
    println!("  email: {}", user.email);
    if let Some(created_at) = &user.created_at {
        println!("  since: {}", created_at);
    }
}

pub fn cards(snapshot: &ViewSnapshot, cards: &[CardView]) {
    match snapshot.empty_state() {
        Some(EmptyState::NoData) => {
            println!("{}", "No questions yet.".yellow());
            return;
        }
        Some(EmptyState::FilteredOut) => {
            println!(
                "{}",
                format!(
                    "No questions match the current filters ({} hidden).",
                    snapshot.base_len
                )
                .yellow()
            );
            return;
        }
        None => {}
    }

    for card in cards {
        let mut badges = Vec::new();
        if let Some(category) = &card.category {
            badges.push(category.bright_blue().to_string());
        }
        if card.is_public {
            badges.push("public".bright_magenta().to_string());
        }
        if card.controls.play_audio {
            badges.push("♪ audio".green().to_string());
        }

        println!("{} {}", card.id.dimmed(), badges.join(" "));
        println!("  {} {}", "Q:".bold(), card.question_preview);
        println!("  {} {}", "A:".bold(), card.answer_preview);
        if !card.tags.is_empty() {
            let tags: Vec<String> = card.tags.iter().map(|t| format!("#{}", t)).collect();
            println!("  {}", tags.join(" ").cyan());
        }
    }
    println!(
        "{}",
        format!("{} of {} question(s)", snapshot.filtered.len(), snapshot.base_len).dimmed()
    );
}

pub fn tags(tags: &[String]) {
    if tags.is_empty() {
        println!("{}", "No tags.".yellow());
        return;
    }
    for tag in tags {
        println!("#{}", tag);
    }
}
