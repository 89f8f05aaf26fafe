//! Terminal rendering for command results.

use bugboard_client::views::ThreadSnapshot;
use bugboard_core::bug::{valid_transitions, Bug, BugStatus};
use bugboard_core::policy::BugActions;
use bugboard_core::user::User;
use bugboard_events::{ClientEvent, NoticeLevel};
use serde::Serialize;
use tokio::sync::broadcast;

pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_user(user: &User) {
    println!("{} (#{})", user.username, user.id);
    println!("  email: {}", user.email);
    println!("  role:  {}", user.role);
    println!("  score: {:.1}", user.score);
    if user.banned {
        println!("  banned");
    }
}

pub fn print_bug_line(bug: &Bug) {
    let tags: Vec<&str> = bug.tags().map(|t| t.name.as_str()).collect();
    let tags = if tags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", tags.join(", "))
    };
    println!(
        "{:>5}  {:<11}  {:>4}  {}  by {}{tags}",
        bug.id,
        bug.status.as_str(),
        bug.vote_count,
        bug.title,
        bug.author.username,
    );
}

pub fn print_thread(snapshot: &ThreadSnapshot, actions: Option<BugActions>) {
    let bug = &snapshot.bug;
    println!("#{} {}", bug.id, bug.title);
    println!(
        "{} | {} votes | by {} on {}",
        bug.status,
        bug.vote_count,
        bug.author.username,
        bug.created_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(image) = &bug.image {
        println!("image: {image}");
    }
    println!();
    println!("{}", bug.description);

    if let Some(actions) = actions {
        let mut offered = Vec::new();
        if actions.edit {
            offered.push("edit");
        }
        if actions.delete {
            offered.push("delete");
        }
        if actions.vote {
            offered.push("vote");
        }
        if actions.comment {
            offered.push("comment");
        }
        if actions.accept_answers {
            offered.push("accept");
        }
        if !offered.is_empty() {
            println!();
            println!("you can: {}", offered.join(", "));
        }
        if actions.edit {
            let next: Vec<&str> = valid_transitions(bug.status).into_iter().map(BugStatus::as_str).collect();
            println!("status can move to: {}", next.join(", "));
        }
    }

    println!();
    println!("{} answer(s)", snapshot.comments.len());
    for comment in &snapshot.comments {
        let mark = if comment.accepted { " [accepted]" } else { "" };
        println!(
            "- #{} by {} ({} votes){mark}",
            comment.id, comment.author.username, comment.vote_count
        );
        for line in comment.text.lines() {
            println!("    {line}");
        }
    }
}

/// Print notices published while the command ran. Error notices are skipped
/// since the failing command already reports the same message.
pub fn print_notices(rx: &mut broadcast::Receiver<ClientEvent>) {
    while let Ok(event) = rx.try_recv() {
        if let ClientEvent::Notice(notice) = event {
            match notice.level {
                NoticeLevel::Error => {}
                NoticeLevel::Warning => eprintln!("warning: {}", notice.message),
                NoticeLevel::Info => println!("{}", notice.message),
            }
        }
    }
}
