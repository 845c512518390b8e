//! Plain-text rendering of store state.

use trackops::api::types::{
    DashboardStats, Deployment, Issue, IssueStatus, Project, Server, Service, Sprint, Team,
    TeamMember, User,
};
use trackops::notify::NotificationManager;
use trackops::pagination::Pagination;

const TITLE_WIDTH: usize = 40;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn footer(pagination: &Pagination) {
    if pagination.total == 0 {
        println!("No results.");
        return;
    }
    println!(
        "Showing {}-{} of {} (page {}/{})",
        pagination.start_index(),
        pagination.end_index(),
        pagination.total,
        pagination.page,
        pagination.total_pages()
    );
}

pub fn projects(items: &[Project]) {
    println!("{:>4}  {:<30} {:<10} {:>5}", "ID", "NAME", "STATUS", "TEAM");
    for p in items {
        println!(
            "{:>4}  {:<30} {:<10} {:>5}",
            p.id,
            truncate(&p.name, 30),
            p.status,
            p.team_id
        );
    }
}

pub fn project(p: &Project) {
    println!("{}", p);
    println!("  Status:     {}", p.status.label());
    println!("  Team:       {}", p.team_id);
    println!("  Dates:      {} to {}", or_dash(p.start_date.as_ref()), or_dash(p.end_date.as_ref()));
    if let Some(url) = &p.repository_url {
        println!("  Repository: {}", url);
    }
    if let Some(description) = &p.description {
        println!();
        println!("{}", description);
    }
}

pub fn sprints(items: &[Sprint]) {
    println!("{:>4}  {:<24} {:<10} {:>7}  {}", "ID", "NAME", "STATUS", "PROJECT", "GOAL");
    for s in items {
        println!(
            "{:>4}  {:<24} {:<10} {:>7}  {}",
            s.id,
            truncate(&s.name, 24),
            s.status,
            s.project_id,
            s.goal.as_deref().unwrap_or_default()
        );
    }
}

pub fn issues(items: &[Issue]) {
    println!(
        "{:>4}  {:<w$} {:<11} {:<8} {:<11} {:>8}",
        "ID",
        "TITLE",
        "TYPE",
        "PRIORITY",
        "STATUS",
        "ASSIGNEE",
        w = TITLE_WIDTH
    );
    for i in items {
        println!(
            "{:>4}  {:<w$} {:<11} {:<8} {:<11} {:>8}",
            i.id,
            truncate(&i.title, TITLE_WIDTH),
            i.issue_type,
            i.priority,
            i.status,
            or_dash(i.assignee_id),
            w = TITLE_WIDTH
        );
    }
}

pub fn issue(i: &Issue) {
    println!("{}", i);
    println!("  Type:     {}", i.issue_type.label());
    println!("  Status:   {}", i.status.label());
    println!("  Priority: {}", i.priority.label());
    println!("  Project:  {}", i.project_id);
    println!("  Sprint:   {}", or_dash(i.sprint_id));
    println!("  Assignee: {}", or_dash(i.assignee_id));
    println!("  Reporter: {}", i.reporter_id);
    println!("  Points:   {}", or_dash(i.story_points));
    if let Some(due) = &i.due_date {
        println!("  Due:      {}", due);
    }
    if let Some(description) = &i.description {
        println!();
        println!("{}", description);
    }
}

pub fn board(columns: &[(IssueStatus, Vec<&Issue>)]) {
    for (status, issues) in columns {
        println!("{} ({})", status.label(), issues.len());
        for i in issues {
            println!("  #{:<4} {} [{}]", i.id, truncate(&i.title, TITLE_WIDTH), i.priority);
        }
    }
}

pub fn teams(items: &[Team]) {
    println!("{:>4}  {:<20} {}", "ID", "NAME", "DESCRIPTION");
    for t in items {
        println!(
            "{:>4}  {:<20} {}",
            t.id,
            truncate(&t.name, 20),
            t.description.as_deref().unwrap_or_default()
        );
    }
}

pub fn members(items: &[TeamMember]) {
    println!("{:>4}  {:>5}  {:<8} {}", "ID", "USER", "ROLE", "JOINED");
    for m in items {
        println!(
            "{:>4}  {:>5}  {:<8} {}",
            m.id,
            m.user_id,
            m.role,
            m.joined_at.format("%Y-%m-%d")
        );
    }
}

pub fn users(items: &[User]) {
    println!("{:>4}  {:<20} {:<30} {}", "ID", "NAME", "EMAIL", "ACTIVE");
    for u in items {
        println!(
            "{:>4}  {:<20} {:<30} {}",
            u.id,
            truncate(u.display_name(), 20),
            truncate(&u.email, 30),
            if u.is_active { "yes" } else { "no" }
        );
    }
}

pub fn user(u: &User) {
    println!("{}", u);
    println!("  Username: {}", u.username);
    println!("  Initials: {}", u.initials());
    if u.is_superuser() {
        println!("  Role:     superuser");
    }
}

pub fn servers(items: &[Server]) {
    println!(
        "{:>4}  {:<18} {:<12} {:<14} {:<12} {}",
        "ID", "NAME", "ENV", "TYPE", "STATUS", "ADDRESS"
    );
    for s in items {
        println!(
            "{:>4}  {:<18} {:<12} {:<14} {:<12} {}",
            s.id,
            truncate(&s.name, 18),
            s.environment,
            s.server_type,
            s.status,
            s.ip_address
        );
    }
}

pub fn services(items: &[Service]) {
    println!(
        "{:>4}  {:<20} {:<12} {:<10} {:>6} {:>6}  {}",
        "ID", "NAME", "TYPE", "STATUS", "SERVER", "PORT", "VERSION"
    );
    for s in items {
        println!(
            "{:>4}  {:<20} {:<12} {:<10} {:>6} {:>6}  {}",
            s.id,
            truncate(&s.name, 20),
            s.service_type,
            s.status,
            s.server_id,
            or_dash(s.port),
            s.current_version.as_deref().unwrap_or("-")
        );
    }
}

pub fn deployments(items: &[Deployment]) {
    println!(
        "{:>4}  {:>7}  {:<12} {:<12} {:<12} {}",
        "ID", "SERVICE", "VERSION", "ENV", "STATUS", "NOTES"
    );
    for d in items {
        println!(
            "{:>4}  {:>7}  {:<12} {:<12} {:<12} {}",
            d.id,
            d.service_id,
            truncate(&d.version, 12),
            d.environment,
            d.status,
            d.notes.as_deref().unwrap_or_default()
        );
    }
}

pub fn stats(stats: &DashboardStats) {
    println!("Projects:       {}", stats.total_projects);
    println!("Active sprints: {}", stats.active_sprints);
    println!("Open issues:    {}", stats.open_issues);
    println!("My tasks:       {}", stats.my_tasks);
}

/// Print queued notifications to stderr so they never mix with data.
pub fn notifications(manager: &NotificationManager) {
    for notification in manager.iter() {
        eprintln!("{}", notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 8), "a longe…");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None::<i64>), "-");
        assert_eq!(or_dash(Some(3)), "3");
    }
}
