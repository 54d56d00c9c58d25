//! Assembly identities and display names.
//!
//! An [`AssemblyIdentity`] names an assembly the way the runtime binds to it: a simple name, a
//! four part version, an optional culture and an optional strong name. Identities are read from
//! the `Assembly` and `AssemblyRef` tables, or parsed from display names such as the values of
//! `InternalsVisibleToAttribute`:
//!
//! ```text
//! Friend, Version=1.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089
//! ```

use std::{fmt, str::FromStr};

use crate::{
    metadata::{
        flags::AssemblyFlags,
        identity::cryptographic::{PublicKeyOrToken, PUBLIC_KEY_TOKEN_SIZE},
    },
    Error, Result,
};

/// A four part assembly version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssemblyVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl AssemblyVersion {
    /// Create a version from its parts
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a version of one to four dot separated parts; missing parts are 0.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] for more than four parts or a part that is not a
    /// 16-bit number
    pub fn parse(value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.trim().split('.').collect();
        if parts.len() > 4 {
            return Err(bad_image_error!("Invalid version format - {}", value));
        }

        let mut components = [0_u16; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse::<u16>()
                .map_err(|_| bad_image_error!("Invalid version component - '{}'", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for AssemblyVersion {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

/// Processor architecture named in a display name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ProcessorArchitecture {
    None,
    MSIL,
    X86,
    IA64,
    AMD64,
    ARM,
    ARM64,
}

impl ProcessorArchitecture {
    /// Parse an architecture name, case insensitive.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] for unknown names
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "msil" => Ok(Self::MSIL),
            "x86" => Ok(Self::X86),
            "ia64" => Ok(Self::IA64),
            "amd64" | "x64" => Ok(Self::AMD64),
            "arm" => Ok(Self::ARM),
            "arm64" => Ok(Self::ARM64),
            _ => Err(bad_image_error!(
                "Unknown processor architecture - '{}'",
                value.trim()
            )),
        }
    }
}

impl fmt::Display for ProcessorArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessorArchitecture::None => "None",
            ProcessorArchitecture::MSIL => "MSIL",
            ProcessorArchitecture::X86 => "x86",
            ProcessorArchitecture::IA64 => "IA64",
            ProcessorArchitecture::AMD64 => "AMD64",
            ProcessorArchitecture::ARM => "ARM",
            ProcessorArchitecture::ARM64 => "ARM64",
        };
        f.write_str(name)
    }
}

/// The identity of an assembly
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    /// Simple name
    pub name: String,
    /// Version
    pub version: AssemblyVersion,
    /// Culture, `None` for culture neutral assemblies
    pub culture: Option<String>,
    /// Strong name, `None` for unsigned assemblies
    pub public_key_or_token: Option<PublicKeyOrToken>,
    /// `Retargetable` and content type flags; the public key bit is derived from
    /// [`AssemblyIdentity::public_key_or_token`]
    pub flags: AssemblyFlags,
    /// Processor architecture, if named in a display name
    pub processor_architecture: Option<ProcessorArchitecture>,
}

impl AssemblyIdentity {
    /// A culture neutral, unsigned identity
    #[must_use]
    pub fn new(name: &str, version: AssemblyVersion) -> Self {
        AssemblyIdentity {
            name: name.to_string(),
            version,
            culture: None,
            public_key_or_token: None,
            flags: AssemblyFlags::empty(),
            processor_architecture: None,
        }
    }

    /// Parse a display name.
    ///
    /// The simple name comes first and is followed by comma separated `Key=Value` pairs. The keys
    /// `Version`, `Culture`, `PublicKeyToken`, `PublicKey`, `ProcessorArchitecture`,
    /// `Retargetable` and `ContentType` are understood, case insensitively; others are ignored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cilmeta::metadata::identity::AssemblyIdentity;
    ///
    /// let identity = AssemblyIdentity::parse(
    ///     "Friend, Version=1.2.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
    /// )?;
    /// assert_eq!(identity.name, "Friend");
    /// assert_eq!(identity.version.minor, 2);
    /// assert!(identity.culture.is_none());
    /// assert!(identity.is_strong_named());
    /// # Ok::<(), cilmeta::Error>(())
    /// ```
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] for an empty name, a malformed pair, a bad
    /// version or hex value, an unknown architecture or a key given more than once
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',');

        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(bad_image_error!("Assembly name cannot be empty"));
        }
        if name.contains('=') {
            return Err(bad_image_error!("Invalid assembly name - '{}'", name));
        }

        let mut identity = AssemblyIdentity::new(name, AssemblyVersion::default());
        let mut seen: Vec<String> = Vec::new();

        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err(bad_image_error!("Invalid display name component - '{}'", part));
            };
            let key = key.trim();
            let value = value.trim();

            let normalized = key.to_ascii_lowercase();
            if seen.contains(&normalized) {
                return Err(bad_image_error!("Duplicate display name key - {}", key));
            }
            seen.push(normalized.clone());

            match normalized.as_str() {
                "version" => identity.version = AssemblyVersion::parse(value)?,
                "culture" => {
                    if !value.eq_ignore_ascii_case("neutral") && !value.is_empty() {
                        identity.culture = Some(value.to_string());
                    }
                }
                "publickeytoken" => {
                    if seen.iter().any(|key| key == "publickey") {
                        continue;
                    }
                    if value.eq_ignore_ascii_case("null") || value.is_empty() {
                        continue;
                    }

                    let bytes = hex::decode(value).map_err(|error| {
                        bad_image_error!("Invalid hex in PublicKeyToken '{}': {}", value, error)
                    })?;
                    let token: [u8; PUBLIC_KEY_TOKEN_SIZE] =
                        bytes.as_slice().try_into().map_err(|_| {
                            bad_image_error!(
                                "PublicKeyToken must be {} bytes, got {}",
                                PUBLIC_KEY_TOKEN_SIZE,
                                bytes.len()
                            )
                        })?;
                    identity.public_key_or_token = Some(PublicKeyOrToken::Token(token));
                }
                "publickey" => {
                    let bytes = hex::decode(value).map_err(|error| {
                        bad_image_error!("Invalid hex in PublicKey '{}': {}", value, error)
                    })?;
                    if !bytes.is_empty() {
                        identity.public_key_or_token = Some(PublicKeyOrToken::PublicKey(bytes));
                    }
                }
                "processorarchitecture" => {
                    identity.processor_architecture = Some(ProcessorArchitecture::parse(value)?);
                }
                "retargetable" => {
                    if value.eq_ignore_ascii_case("yes") {
                        identity.flags |= AssemblyFlags::RETARGETABLE;
                    } else if !value.eq_ignore_ascii_case("no") {
                        return Err(bad_image_error!("Invalid Retargetable value - '{}'", value));
                    }
                }
                "contenttype" => {
                    if value.eq_ignore_ascii_case("windowsruntime") {
                        identity.flags |= AssemblyFlags::WINDOWS_RUNTIME;
                    } else if !value.eq_ignore_ascii_case("default") {
                        return Err(bad_image_error!("Invalid ContentType value - '{}'", value));
                    }
                }
                _ => {}
            }
        }

        Ok(identity)
    }

    /// True if the identity carries a public key or token
    #[must_use]
    pub fn is_strong_named(&self) -> bool {
        self.public_key_or_token.is_some()
    }

    /// True if the identity has the full public key
    #[must_use]
    pub fn has_public_key(&self) -> bool {
        matches!(
            self.public_key_or_token,
            Some(PublicKeyOrToken::PublicKey(_))
        )
    }

    /// The full public key, empty if only a token or nothing is known
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        self.public_key_or_token
            .as_ref()
            .and_then(PublicKeyOrToken::public_key)
            .unwrap_or_default()
    }

    /// The public key token, `None` for unsigned assemblies
    #[must_use]
    pub fn public_key_token(&self) -> Option<[u8; PUBLIC_KEY_TOKEN_SIZE]> {
        self.public_key_or_token.as_ref().map(PublicKeyOrToken::token)
    }

    /// True for assemblies with no culture
    #[must_use]
    pub fn is_culture_neutral(&self) -> bool {
        self.culture.is_none()
    }

    /// True if the identity is marked retargetable
    #[must_use]
    pub fn is_retargetable(&self) -> bool {
        self.flags.contains(AssemblyFlags::RETARGETABLE)
    }

    /// The display name, e.g. `Name, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null`
    #[must_use]
    pub fn display_name(&self) -> String {
        let token = match self.public_key_token() {
            Some(token) => hex::encode(token),
            None => "null".to_string(),
        };

        let mut result = format!(
            "{}, Version={}, Culture={}, PublicKeyToken={}",
            self.name,
            self.version,
            self.culture.as_deref().unwrap_or("neutral"),
            token
        );

        if self.is_retargetable() {
            result.push_str(", Retargetable=Yes");
        }
        if self.flags.contains(AssemblyFlags::WINDOWS_RUNTIME) {
            result.push_str(", ContentType=WindowsRuntime");
        }

        result
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for AssemblyIdentity {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}
