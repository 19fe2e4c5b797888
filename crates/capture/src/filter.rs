// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request body filters narrowing what a session captures.

/// Backend command names exercised by the OMS test suite.
pub const DEFAULT_OMS_COMMANDS: &[&str] = &[
    "Login",
    "ValidateTwoFA",
    "NewOrder",
    "CancelOrder",
    "ModifyOrder",
    "OrderBook",
    "TradeBook",
    "OrderHistory",
    "Holdings",
    "Positions",
    "Limits",
    "GetAssets",
    "OptionChain",
];

/// Predicate deciding whether a matched request is captured.
pub trait BodyFilter: Send + Sync {
    fn accepts(&self, url: &str, body: Option<&str>) -> bool;
}

impl<F> BodyFilter for F
where
    F: Fn(&str, Option<&str>) -> bool + Send + Sync,
{
    fn accepts(&self, url: &str, body: Option<&str>) -> bool {
        self(url, body)
    }
}

/// Accepts bodies naming one of a set of backend commands.
///
/// A command matches when its name appears as a quoted JSON string, so
/// `"cmd":"NewOrder"` matches `NewOrder` but `"cmd":"NewOrderBulk"` does not.
/// Requests without a body never match.
#[derive(Clone, Debug)]
pub struct CommandFilter {
    markers: Vec<String>,
}

impl CommandFilter {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let markers = commands
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .map(|c| format!("\"{c}\""))
            .collect();
        Self { markers }
    }

    /// Filter over [`DEFAULT_OMS_COMMANDS`].
    pub fn oms_default() -> Self {
        Self::new(DEFAULT_OMS_COMMANDS)
    }

    /// The command matched by `body`, if any.
    pub fn matched_command<'a>(&'a self, body: &str) -> Option<&'a str> {
        self.markers
            .iter()
            .find(|m| body.contains(m.as_str()))
            .map(|m| m.trim_matches('"'))
    }
}

impl BodyFilter for CommandFilter {
    fn accepts(&self, _url: &str, body: Option<&str>) -> bool {
        body.is_some_and(|b| self.matched_command(b).is_some())
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
