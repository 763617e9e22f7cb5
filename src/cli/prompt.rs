//! Interactive password prompts

use crate::credential::key::{MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};
use crate::models::BundleFormat;
use console::style;
use std::ops::RangeInclusive;
use zeroize::Zeroizing;

/// Accepted length of a prompted keystore password, in characters
pub const TARGET_PROMPT_LEN: RangeInclusive<usize> = 5..=20;

/// The private key password, prompting when it was not given
pub fn source_password(given: Option<&str>) -> anyhow::Result<Zeroizing<String>> {
    if let Some(password) = given {
        return Ok(Zeroizing::new(password.to_string()));
    }

    if !console::Term::stderr().is_term() {
        anyhow::bail!("The private key requires a password (use --password)");
    }

    prompt_until_valid(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN, || {
        dialoguer::Password::new()
            .with_prompt("Private key password")
            .interact()
    })
}

/// The keystore password.
///
/// `None` keeps the private key password. An empty value means the flag was
/// given without one, so the password is prompted with confirmation.
pub fn target_password(
    given: Option<&str>,
    format: BundleFormat,
) -> anyhow::Result<Option<Zeroizing<String>>> {
    match given {
        None => Ok(None),
        Some(password) if !password.is_empty() => Ok(Some(Zeroizing::new(password.to_string()))),
        Some(_) => {
            if !console::Term::stderr().is_term() {
                anyhow::bail!("The keystore password must be given (use --password-final <PWD>)");
            }

            let password = prompt_until_valid(target_prompt_policy(format), || {
                dialoguer::Password::new()
                    .with_prompt(format!("{} keystore password", format))
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()
            })?;
            Ok(Some(password))
        }
    }
}

fn prompt_until_valid<F>(policy: RangeInclusive<usize>, mut prompt: F) -> anyhow::Result<Zeroizing<String>>
where
    F: FnMut() -> dialoguer::Result<String>,
{
    loop {
        let password = Zeroizing::new(prompt()?);
        if policy.contains(&password.chars().count()) {
            return Ok(password);
        }
        eprintln!(
            "  {} Must be between {} and {} characters",
            style("✗").red(),
            policy.start(),
            policy.end()
        );
    }
}

/// Length policy for a prompted keystore password: the prompt rule narrowed
/// by whatever the format itself allows
fn target_prompt_policy(format: BundleFormat) -> RangeInclusive<usize> {
    let allowed = format.password_policy();
    let start = (*TARGET_PROMPT_LEN.start()).max(*allowed.start());
    let end = (*TARGET_PROMPT_LEN.end()).min(*allowed.end());
    start..=end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_prompt_policy_for_every_format() {
        assert_eq!(target_prompt_policy(BundleFormat::P12), 5..=20);
        assert_eq!(target_prompt_policy(BundleFormat::Jks), 5..=20);
    }

    #[test]
    fn test_short_prompted_password_is_asked_again() {
        let mut answers = vec!["a".to_string(), "abc".to_string(), "abcde".to_string()].into_iter();
        let mut asked = 0;
        let password = prompt_until_valid(target_prompt_policy(BundleFormat::P12), || {
            asked += 1;
            Ok(answers.next().unwrap())
        })
        .unwrap();

        assert_eq!(password.as_str(), "abcde");
        assert_eq!(asked, 3);
    }

    #[test]
    fn test_long_prompted_password_is_asked_again() {
        let mut answers = vec!["x".repeat(21), "x".repeat(20)].into_iter();
        let password = prompt_until_valid(target_prompt_policy(BundleFormat::Jks), || {
            Ok(answers.next().unwrap())
        })
        .unwrap();
        assert_eq!(password.chars().count(), 20);
    }
}
