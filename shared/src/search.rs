use crate::model::UserRecord;

/// Users whose name or email contains `term`, ignoring case, in collection order.
/// An empty term keeps everyone.
pub fn filter_users<'a>(users: &'a [UserRecord], term: &str) -> Vec<&'a UserRecord> {
    let q = term.to_lowercase();
    if q.is_empty() {
        return users.iter().collect();
    }
    users
        .iter()
        .filter(|u| u.name.to_lowercase().contains(&q) || u.email.to_lowercase().contains(&q))
        .collect()
}
