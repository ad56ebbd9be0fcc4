//! Candidate labels and their built-in cue lexicons.

use std::fmt;

/// Zero-shot candidate label for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskLabel {
    /// Investment or token fraud.
    CryptoScam,
    /// Pressure around accounts, payments or deadlines.
    UrgentFinancialThreat,
    /// Lures towards links or downloads.
    SuspiciousLink,
    /// Everyday chatter.
    NeutralConversation,
    /// Factual reporting.
    SafeNews,
}

impl RiskLabel {
    /// Every label in scoring order.
    pub const ALL: [Self; 5] = [
        Self::CryptoScam,
        Self::UrgentFinancialThreat,
        Self::SuspiciousLink,
        Self::NeutralConversation,
        Self::SafeNews,
    ];

    /// Human-readable label text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CryptoScam => "crypto scam",
            Self::UrgentFinancialThreat => "urgent financial threat",
            Self::SuspiciousLink => "suspicious link",
            Self::NeutralConversation => "neutral conversation",
            Self::SafeNews => "safe news",
        }
    }

    /// Whether the label contributes to the risk score.
    #[must_use]
    pub const fn is_risky(self) -> bool {
        matches!(
            self,
            Self::CryptoScam | Self::UrgentFinancialThreat | Self::SuspiciousLink
        )
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    pub(crate) const fn default_cues(self) -> &'static [&'static str] {
        match self {
            Self::CryptoScam => &[
                "crypto",
                "bitcoin",
                "btc",
                "ethereum",
                "wallet",
                "airdrop",
                "giveaway",
                "token",
                "doubling",
                "invest",
                "investment",
                "profit",
                "guaranteed",
                "returns",
                "mining",
                "blockchain",
                "nft",
            ],
            Self::UrgentFinancialThreat => &[
                "urgent",
                "immediately",
                "suspended",
                "locked",
                "overdue",
                "penalty",
                "verify",
                "account",
                "bank",
                "payment",
                "fraud",
                "deadline",
                "final",
                "warning",
                "debt",
                "tax",
                "refund",
            ],
            Self::SuspiciousLink => &[
                "click", "link", "login", "download", "redirect", "claim", "prize", "winner",
                "free", "offer", "unsubscribe", "attachment",
            ],
            Self::NeutralConversation => &[
                "hello", "thanks", "meeting", "lunch", "friend", "weekend", "family", "today",
                "tomorrow", "coffee", "talk", "chat", "dinner", "birthday",
            ],
            Self::SafeNews => &[
                "report",
                "announced",
                "according",
                "official",
                "government",
                "research",
                "study",
                "published",
                "weather",
                "election",
                "minister",
                "university",
                "health",
                "science",
            ],
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
