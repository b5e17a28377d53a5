//! Format checks for resolved values
// (c) 2024 Ross Younger

use crate::errors::{Error, Result};

/// Keys whose value must be `yes` or `no`
const YES_NO_KEYS: &[&str] = &[
    "BatchMode",
    "CanonicalizeFallbackLocal",
    "ChallengeResponseAuthentication",
    "CheckHostIP",
    "ClearAllForwardings",
    "Compression",
    "EnableSSHKeysign",
    "ExitOnForwardFailure",
    "ForwardX11",
    "ForwardX11Trusted",
    "GatewayPorts",
    "GSSAPIAuthentication",
    "GSSAPIDelegateCredentials",
    "HostbasedAuthentication",
    "IdentitiesOnly",
    "KbdInteractiveAuthentication",
    "NoHostAuthenticationForLocalhost",
    "PasswordAuthentication",
    "PermitLocalCommand",
    "PubkeyAuthentication",
    "RhostsRSAAuthentication",
    "RSAAuthentication",
    "StreamLocalBindUnlink",
    "TCPKeepAlive",
    "UseKeychain",
    "UsePrivilegedPort",
    "VisualHostKey",
];

/// Keys whose value must be an unsigned integer
const UINT_KEYS: &[&str] = &[
    "CanonicalizeMaxDots",
    "CompressionLevel",
    "ConnectionAttempts",
    "NumberOfPasswordPrompts",
    "Port",
    "ServerAliveCountMax",
    "ServerAliveInterval",
];

fn is_one_of(key: &str, list: &[&str]) -> bool {
    list.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Checks that `value` is acceptable for `key`.
///
/// Keys we know nothing about are always accepted.
pub fn validate(key: &str, value: &str) -> Result<()> {
    let fail = |reason: String| Error::Validation {
        key: key.into(),
        value: value.into(),
        reason,
    };
    if is_one_of(key, YES_NO_KEYS) {
        if value != "yes" && value != "no" {
            return Err(fail("must be yes or no".into()));
        }
    } else if is_one_of(key, UINT_KEYS) {
        let number = value.parse::<u64>().map_err(|e| fail(e.to_string()))?;
        if key.eq_ignore_ascii_case("port") && !(1..=65535).contains(&number) {
            return Err(fail("port must be in the range 1-65535".into()));
        }
    }
    Ok(())
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::validate;
    use crate::errors::Error;
    use anyhow::{anyhow, Context, Result};
    use assertables::{assert_contains, assert_ok_as_result};

    #[test]
    fn good_values() -> Result<()> {
        for (key, value) in [
            ("Port", "22"),
            ("port", "65535"),
            ("Compression", "yes"),
            ("compression", "no"),
            ("ServerAliveInterval", "0"),
            ("HostName", "anything at all"),
            ("Ciphers", "+aes128-cbc"),
        ] {
            assert_ok_as_result!(validate(key, value))
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("{key} {value}"))?;
        }
        Ok(())
    }

    #[test]
    fn bad_values() {
        for (key, value) in [
            ("Port", "notanumber"),
            ("Port", "0"),
            ("Port", "65536"),
            ("Port", "-1"),
            ("Compression", "Yes"),
            ("BatchMode", "true"),
            ("ConnectionAttempts", "1.5"),
        ] {
            let err = validate(key, value).unwrap_err();
            assert!(matches!(err, Error::Validation { .. }), "{key} {value}");
            assert_contains!(err.to_string(), value);
        }
    }
}
