use std::collections::HashSet;

/// Fixed allow-list of super-admin phone numbers.
///
/// Membership is deployment configuration. It is consulted on every request and
/// never read back from stored user records.
#[derive(Debug, Clone, Default)]
pub struct SuperAdmins {
    phone_numbers: HashSet<String>,
}

impl SuperAdmins {
    pub fn new<I, S>(phone_numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phone_numbers: phone_numbers
                .into_iter()
                .map(Into::into)
                .map(|p: String| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_super_admin(&self, phone_number: &str) -> bool {
        self.phone_numbers.contains(phone_number)
    }

    /// Allow-listed numbers in a stable order, for store-side exclusion.
    pub fn to_vec(&self) -> Vec<String> {
        let mut numbers: Vec<String> = self.phone_numbers.iter().cloned().collect();
        numbers.sort();
        numbers
    }

    pub fn len(&self) -> usize {
        self.phone_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phone_numbers.is_empty()
    }
}
