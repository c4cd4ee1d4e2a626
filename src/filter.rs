//! Narrowing and paging the user and invitation listings.

use crate::models::{Invitation, InvitationStatus, Role, User};

/// How many rows the console shows per page.
pub const PAGE_SIZE: usize = 10;

/// Criteria for the user listing. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Option<Role>,
}

impl UserFilter {
    pub fn is_empty(&self) -> bool { *self == UserFilter::default() }

    pub fn matches(&self, user: &User) -> bool {
        contains(&user.first_name, &self.first_name)
            && contains(&user.last_name, &self.last_name)
            && contains(&user.email, &self.email)
            && self.role.map_or(true, |role| user.role == role.as_str())
    }

    pub fn apply<'a>(&self, users: &'a [User]) -> Vec<&'a User> {
        users.iter().filter(|u| self.matches(u)).collect()
    }

    /// The query string the backend's user listing understands.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        for (key, value) in &[
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
        ] {
            if !value.is_empty() {
                query.push((*key, value.to_string()));
            }
        }
        if let Some(role) = self.role {
            query.push(("role", role.as_str().to_string()));
        }

        query
    }
}

/// Criteria for the invitation listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvitationFilter {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Option<Role>,
    pub status: Option<InvitationStatus>,
}

impl InvitationFilter {
    pub fn matches(&self, invitation: &Invitation) -> bool {
        contains(&invitation.first_name, &self.first_name)
            && contains(&invitation.last_name, &self.last_name)
            && contains(&invitation.email, &self.email)
            && self.role.map_or(true, |role| invitation.role == role)
            && self.status.map_or(true, |status| invitation.status == status)
    }

    pub fn apply<'a>(
        &self,
        invitations: &'a [Invitation],
    ) -> Vec<&'a Invitation> {
        invitations.iter().filter(|i| self.matches(i)).collect()
    }
}

/// A single page cut out of a longer listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Take the `page`-th (1-based) page of `per_page` items.
///
/// There is always at least one page, and out-of-range page numbers are
/// clamped.
pub fn paginate<T, I>(items: I, page: usize, per_page: usize) -> Page<T>
where
    I: IntoIterator<Item = T>,
{
    let per_page = per_page.max(1);
    let items: Vec<T> = items.into_iter().collect();
    let total_items = items.len();
    let partial = usize::from(total_items % per_page != 0);
    let total_pages = (total_items / per_page + partial).max(1);
    let current_page = page.max(1).min(total_pages);

    let items = items
        .into_iter()
        .skip((current_page - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        current_page,
        total_pages,
        total_items,
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    needle.is_empty()
        || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Id;

    fn user(first: &str, last: &str, role: Role) -> User {
        User {
            id: Id::from(first),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            role: role.as_str().to_string(),
            is_admin: role == Role::Admin,
        }
    }

    fn invitation(email: &str, status: InvitationStatus) -> Invitation {
        Invitation {
            id: None,
            first_name: String::new(),
            last_name: String::new(),
            email: email.to_string(),
            role: Role::User,
            status,
        }
    }

    #[test]
    fn text_filters_are_case_insensitive_substrings() {
        let users = vec![
            user("John", "Doe", Role::Admin),
            user("Jane", "Smith", Role::User),
            user("Alice", "Brown", Role::CoAdmin),
        ];
        let filter = UserFilter {
            first_name: String::from("jo"),
            ..UserFilter::default()
        };

        let got: Vec<_> =
            filter.apply(&users).into_iter().map(|u| u.name()).collect();

        assert_eq!(got, vec![String::from("John Doe")]);
    }

    #[test]
    fn role_filter_is_exact() {
        let users = vec![
            user("John", "Doe", Role::Admin),
            user("Alice", "Brown", Role::CoAdmin),
        ];
        let filter = UserFilter {
            role: Some(Role::CoAdmin),
            ..UserFilter::default()
        };

        let got = filter.apply(&users);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].first_name, "Alice");
    }

    #[test]
    fn empty_filter_matches_everything() {
        let users = vec![user("John", "Doe", Role::Admin)];

        assert!(UserFilter::default().is_empty());
        assert_eq!(UserFilter::default().apply(&users).len(), 1);
        assert!(UserFilter::default().query().is_empty());
    }

    #[test]
    fn user_filter_becomes_a_query_string() {
        let filter = UserFilter {
            email: String::from("example.com"),
            role: Some(Role::Designer),
            ..UserFilter::default()
        };

        let got = filter.query();

        assert_eq!(
            got,
            vec![
                ("email", String::from("example.com")),
                ("role", String::from("DESIGNER")),
            ]
        );
    }

    #[test]
    fn invitations_filter_on_status() {
        let invitations = vec![
            invitation("john@example.com", InvitationStatus::Pending),
            invitation("jane@example.com", InvitationStatus::Approved),
            invitation("sarah@example.com", InvitationStatus::Pending),
        ];
        let filter = InvitationFilter {
            status: Some(InvitationStatus::Pending),
            email: String::from("SARAH"),
            ..InvitationFilter::default()
        };

        let got = filter.apply(&invitations);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].email, "sarah@example.com");
    }

    #[test]
    fn pages_are_one_based_and_clamped() {
        let page = paginate(1..=25, 3, PAGE_SIZE);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 25);

        let past_the_end = paginate(1..=25, 9, PAGE_SIZE);
        assert_eq!(past_the_end.current_page, 3);

        let first = paginate(1..=25, 0, PAGE_SIZE);
        assert_eq!(first.current_page, 1);
        assert_eq!(first.items.len(), 10);
    }

    #[test]
    fn huge_page_sizes_hold_everything() {
        let page = paginate(vec![1, 2, 3], 1, usize::MAX);

        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
    }

    #[test]
    fn empty_listing_still_has_one_page() {
        let page = paginate(Vec::<u32>::new(), 1, PAGE_SIZE);

        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }
}
