/// Records that may belong to one business profile or be shared by all.
pub trait BusinessScoped {
    type ProfileId: PartialEq;

    /// Owning business profile; `None` marks a globally shared record
    fn business_profile_id(&self) -> Option<&Self::ProfileId>;
}

/// Keep the items owned by `active_profile_id` plus globally shared ones,
/// in input order.
///
/// Returns nothing when there are no items or no active profile. The result
/// depends only on the arguments, so callers must filter again whenever the
/// active profile changes.
pub fn filter_by_business<'a, T>(
    items: Option<&'a [T]>,
    active_profile_id: Option<&T::ProfileId>,
) -> Vec<&'a T>
where
    T: BusinessScoped,
{
    let (Some(items), Some(active)) = (items, active_profile_id) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| match item.business_profile_id() {
            Some(owner) => owner == active,
            None => true,
        })
        .collect()
}
