//! Built-in default values, as documented in ssh_config(5)
// (c) 2024 Ross Younger

use std::collections::HashMap;

use lazy_static::lazy_static;

/// Identity files that ssh tries when none are configured
pub const DEFAULT_IDENTITY_FILES: &[&str] = &[
    "~/.ssh/id_dsa",
    "~/.ssh/id_ecdsa",
    "~/.ssh/id_ed25519",
    "~/.ssh/id_rsa",
];

const DEFAULTS: &[(&str, &str)] = &[
    ("AddKeysToAgent", "no"),
    ("AddressFamily", "any"),
    ("BatchMode", "no"),
    ("CanonicalizeFallbackLocal", "yes"),
    ("CanonicalizeHostname", "no"),
    ("CanonicalizeMaxDots", "1"),
    ("ChallengeResponseAuthentication", "yes"),
    ("CheckHostIP", "yes"),
    ("Cipher", "3des"),
    (
        "Ciphers",
        "chacha20-poly1305@openssh.com,aes128-ctr,aes192-ctr,aes256-ctr,aes128-gcm@openssh.com,aes256-gcm@openssh.com,aes128-cbc,aes192-cbc,aes256-cbc",
    ),
    ("ClearAllForwardings", "no"),
    ("Compression", "no"),
    ("CompressionLevel", "6"),
    ("ConnectionAttempts", "1"),
    ("ControlMaster", "no"),
    ("EnableSSHKeysign", "no"),
    ("EscapeChar", "~"),
    ("ExitOnForwardFailure", "no"),
    ("FingerprintHash", "sha256"),
    ("ForwardAgent", "no"),
    ("ForwardX11", "no"),
    ("ForwardX11Timeout", "20m"),
    ("ForwardX11Trusted", "no"),
    ("GatewayPorts", "no"),
    (
        "GlobalKnownHostsFile",
        "/etc/ssh/ssh_known_hosts /etc/ssh/ssh_known_hosts2",
    ),
    ("GSSAPIAuthentication", "no"),
    ("GSSAPIDelegateCredentials", "no"),
    ("HashKnownHosts", "no"),
    ("HostbasedAuthentication", "no"),
    (
        "HostbasedKeyTypes",
        "ecdsa-sha2-nistp256-cert-v01@openssh.com,ecdsa-sha2-nistp384-cert-v01@openssh.com,ecdsa-sha2-nistp521-cert-v01@openssh.com,ssh-ed25519-cert-v01@openssh.com,ssh-rsa-cert-v01@openssh.com,ecdsa-sha2-nistp256,ecdsa-sha2-nistp384,ecdsa-sha2-nistp521,ssh-ed25519,ssh-rsa",
    ),
    (
        "HostKeyAlgorithms",
        "ecdsa-sha2-nistp256-cert-v01@openssh.com,ecdsa-sha2-nistp384-cert-v01@openssh.com,ecdsa-sha2-nistp521-cert-v01@openssh.com,ssh-ed25519-cert-v01@openssh.com,ssh-rsa-cert-v01@openssh.com,ecdsa-sha2-nistp256,ecdsa-sha2-nistp384,ecdsa-sha2-nistp521,ssh-ed25519,ssh-rsa",
    ),
    ("IdentitiesOnly", "no"),
    ("IPQoS", "lowdelay throughput"),
    ("KbdInteractiveAuthentication", "yes"),
    (
        "KexAlgorithms",
        "curve25519-sha256,curve25519-sha256@libssh.org,ecdh-sha2-nistp256,ecdh-sha2-nistp384,ecdh-sha2-nistp521,diffie-hellman-group-exchange-sha256,diffie-hellman-group-exchange-sha1,diffie-hellman-group14-sha1",
    ),
    ("LogLevel", "INFO"),
    (
        "MACs",
        "umac-64-etm@openssh.com,umac-128-etm@openssh.com,hmac-sha2-256-etm@openssh.com,hmac-sha2-512-etm@openssh.com,hmac-sha1-etm@openssh.com,umac-64@openssh.com,umac-128@openssh.com,hmac-sha2-256,hmac-sha2-512,hmac-sha1",
    ),
    ("NoHostAuthenticationForLocalhost", "no"),
    ("NumberOfPasswordPrompts", "3"),
    ("PasswordAuthentication", "yes"),
    ("PermitLocalCommand", "no"),
    ("Port", "22"),
    (
        "PreferredAuthentications",
        "gssapi-with-mic,hostbased,publickey,keyboard-interactive,password",
    ),
    ("Protocol", "2"),
    ("ProxyUseFdpass", "no"),
    (
        "PubkeyAcceptedKeyTypes",
        "ecdsa-sha2-nistp256-cert-v01@openssh.com,ecdsa-sha2-nistp384-cert-v01@openssh.com,ecdsa-sha2-nistp521-cert-v01@openssh.com,ssh-ed25519-cert-v01@openssh.com,ssh-rsa-cert-v01@openssh.com,ecdsa-sha2-nistp256,ecdsa-sha2-nistp384,ecdsa-sha2-nistp521,ssh-ed25519,ssh-rsa",
    ),
    ("PubkeyAuthentication", "yes"),
    ("RekeyLimit", "default none"),
    ("RhostsRSAAuthentication", "no"),
    ("RSAAuthentication", "yes"),
    ("ServerAliveCountMax", "3"),
    ("ServerAliveInterval", "0"),
    ("StreamLocalBindMask", "0177"),
    ("StreamLocalBindUnlink", "no"),
    ("StrictHostKeyChecking", "ask"),
    ("TCPKeepAlive", "yes"),
    ("Tunnel", "no"),
    ("TunnelDevice", "any:any"),
    ("UpdateHostKeys", "no"),
    ("UseKeychain", "no"),
    ("UsePrivilegedPort", "no"),
    (
        "UserKnownHostsFile",
        "~/.ssh/known_hosts ~/.ssh/known_hosts2",
    ),
    ("VerifyHostKeyDNS", "no"),
    ("VisualHostKey", "no"),
    ("XAuthLocation", "/usr/X11R6/bin/xauth"),
];

lazy_static! {
    /// Lower-cased key to default value
    static ref DEFAULT_TABLE: HashMap<String, &'static str> = DEFAULTS
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), *v))
        .collect();
}

/// Looks up the default value of a key, ignoring case.
///
/// Keys with no fixed default (`HostName`, `User`, `IdentityFile` ...) return `None`.
#[must_use]
pub fn default_for(key: &str) -> Option<&'static str> {
    DEFAULT_TABLE.get(&key.to_ascii_lowercase()).copied()
}

///////////////////////////////////////////////////////////////////////////////////////
