/// SASL credentials handed to the hypervisor when it asks for them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub passphrase: Option<String>,
}

/// A credential kind requested during authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialKind {
    AuthName,
    Passphrase,
    Other(i32),
}

/// Answer an authentication request: one entry per requested kind, `None`
/// for kinds we have nothing for.
pub fn respond(requested: &[CredentialKind], creds: &Credentials) -> Vec<Option<String>> {
    requested
        .iter()
        .map(|kind| match kind {
            CredentialKind::AuthName => creds.username.clone(),
            CredentialKind::Passphrase => creds.passphrase.clone(),
            CredentialKind::Other(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_known_kinds_in_request_order() {
        let creds = Credentials {
            username: Some("admin".into()),
            passphrase: Some("s3cret".into()),
        };
        let answer = respond(&[CredentialKind::Passphrase, CredentialKind::AuthName], &creds);
        assert_eq!(answer, vec![Some("s3cret".into()), Some("admin".into())]);
    }

    #[test]
    fn unknown_kinds_stay_unfilled() {
        let creds = Credentials {
            username: Some("admin".into()),
            passphrase: None,
        };
        let answer = respond(
            &[CredentialKind::Other(7), CredentialKind::AuthName, CredentialKind::Passphrase],
            &creds,
        );
        assert_eq!(answer, vec![None, Some("admin".into()), None]);
    }
}
