//! Top-level navigation: marketing tabs, pricing, plan selection and the
//! dashboard page.

use crate::models::Plan;
use crate::plan_store::PlanStore;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketingTab {
    Home,
    ForBusiness,
    Pricing,
}

impl MarketingTab {
    pub const ALL: [MarketingTab; 3] = [
        MarketingTab::Home,
        MarketingTab::ForBusiness,
        MarketingTab::Pricing,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            MarketingTab::Home => "home",
            MarketingTab::ForBusiness => "for-business",
            MarketingTab::Pricing => "pricing",
        }
    }

    /// Header link text.
    pub fn label(&self) -> &'static str {
        match self {
            MarketingTab::Home => "Find a Pro",
            MarketingTab::ForBusiness => "For Business",
            MarketingTab::Pricing => "Pricing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Marketing(MarketingTab),
    Dashboard,
}

impl Page {
    /// Id of the highlighted header entry.
    pub fn active_id(&self) -> &'static str {
        match self {
            Page::Marketing(tab) => tab.id(),
            Page::Dashboard => "dashboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown page '{0}'")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        if id == "dashboard" {
            return Ok(Page::Dashboard);
        }
        MarketingTab::ALL
            .into_iter()
            .find(|tab| tab.id() == id)
            .map(Page::Marketing)
            .ok_or_else(|| UnknownPage(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
}

/// Transient toast shown after a navigation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: &'static str,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.title, self.description)
    }
}

/// One column of the pricing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingTier {
    pub plan: Plan,
    /// Monthly price in whole dollars.
    pub price: u32,
    pub features: &'static [&'static str],
    pub call_to_action: &'static str,
    pub most_popular: bool,
}

pub const PRICING: [PricingTier; 3] = [
    PricingTier {
        plan: Plan::Starter,
        price: 0,
        features: &["Directory Listing", "Lead Capture (Locked)", "1-Time SEO Audit"],
        call_to_action: "Claim Your Listing",
        most_popular: false,
    },
    PricingTier {
        plan: Plan::Growth,
        price: 49,
        features: &[
            "Featured Directory Listing",
            "Unlock All Leads & CRM",
            "Email & SMS Automation",
            "Monthly SEO Audits",
            "Track 10 Keywords",
        ],
        call_to_action: "Start 7-Day Free Trial",
        most_popular: true,
    },
    PricingTier {
        plan: Plan::Scale,
        price: 99,
        features: &[
            "Everything in Growth",
            "AI Receptionist (250 mins)",
            "Priority Support",
            "Advanced Analytics",
        ],
        call_to_action: "Start 7-Day Free Trial",
        most_popular: false,
    },
];

impl fmt::Display for PricingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ${}/mo", self.plan.display_name(), self.price)?;
        if self.most_popular {
            write!(f, "  MOST POPULAR")?;
        }
        writeln!(f)?;
        for feature in self.features {
            writeln!(f, "  - {}", feature)?;
        }
        write!(f, "  [{}]", self.call_to_action)
    }
}

pub struct PageShell {
    store: Arc<PlanStore>,
    page: Page,
}

impl PageShell {
    /// Opens on the home tab.
    pub fn new(store: Arc<PlanStore>) -> Self {
        Self {
            store,
            page: Page::Marketing(MarketingTab::Home),
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn plan(&self) -> Plan {
        self.store.get()
    }

    pub fn navigate(&mut self, page: Page) -> Page {
        tracing::debug!("Navigating to {}", page.active_id());
        self.page = page;
        self.page
    }

    /// Switches plans and opens the dashboard.
    pub fn select_plan(&mut self, plan: Plan) -> Notice {
        self.store.set(plan);
        self.page = Page::Dashboard;
        Notice {
            level: NoticeLevel::Success,
            title: format!("Welcome to the {} Plan!", plan.display_name()),
            description: "Your new dashboard is ready.",
        }
    }

    /// Sends the user to the pricing tab to pick a bigger plan.
    pub fn upgrade(&mut self) -> Notice {
        self.page = Page::Marketing(MarketingTab::Pricing);
        Notice {
            level: NoticeLevel::Info,
            title: "Please select a new plan to upgrade.".to_string(),
            description: "You are being redirected to the pricing page.",
        }
    }

    pub fn pricing(&self) -> &'static [PricingTier] {
        &PRICING
    }

    pub fn dashboard_heading(&self) -> String {
        format!("Your {} Dashboard", self.plan().display_name())
    }
}
