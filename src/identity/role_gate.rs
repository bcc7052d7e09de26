use super::role::Role;

/// Presentation-only conditional: yields its content when the viewer's role
/// is allowed. Not an access control; the route guard still decides.
#[derive(Debug, Clone, Copy)]
pub struct RoleGate<'a> {
    allowed: &'a [Role],
}

impl<'a> RoleGate<'a> {
    pub const fn new(allowed: &'a [Role]) -> Self { Self { allowed } }

    pub fn admits(&self, role: Option<Role>) -> bool {
        role.is_some_and(|r| self.allowed.contains(&r))
    }

    pub fn render<T>(&self, role: Option<Role>, children: impl FnOnce() -> T) -> Option<T> {
        if self.admits(role) { Some(children()) } else { None }
    }
}
