use crate::error::BmvError;
use std::fmt;
use std::str::FromStr;

/// A BTP address: `btp://<network>/<account>`.
///
/// The network part names a chain; the account part names a contract
/// on it. Relay calls carry the previous-hop and current bridge
/// addresses in this form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BtpAddress {
    net: String,
    account: String,
}

impl BtpAddress {
    pub fn net(&self) -> &str {
        &self.net
    }

    pub fn account(&self) -> &str {
        &self.account
    }
}

impl FromStr for BtpAddress {
    type Err = BmvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("btp://")
            .ok_or_else(|| BmvError::verification(format!("invalid btp address: {}", s)))?;
        let (net, account) = rest
            .split_once('/')
            .ok_or_else(|| BmvError::verification(format!("invalid btp address: {}", s)))?;
        if net.is_empty() || account.is_empty() || account.contains('/') {
            return Err(BmvError::verification(format!("invalid btp address: {}", s)));
        }
        Ok(Self {
            net: net.to_string(),
            account: account.to_string(),
        })
    }
}

impl fmt::Display for BtpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "btp://{}/{}", self.net, self.account)
    }
}
