use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MonthlyPlan {
    Standard,
    Premium,
    Executive,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOffer {
    pub plan: MonthlyPlan,
    pub name: &'static str,
    pub monthly_price: u32,
    pub features: &'static [&'static str],
}

impl MonthlyPlan {
    pub const ALL: [MonthlyPlan; 3] = [
        MonthlyPlan::Standard,
        MonthlyPlan::Premium,
        MonthlyPlan::Executive,
    ];

    pub fn offer(&self) -> PlanOffer {
        match self {
            MonthlyPlan::Standard => PlanOffer {
                plan: *self,
                name: "Standard",
                monthly_price: 120,
                features: &["Any regular spot", "Mon-Fri access", "Email support"],
            },
            MonthlyPlan::Premium => PlanOffer {
                plan: *self,
                name: "Premium",
                monthly_price: 200,
                features: &[
                    "Reserved spot",
                    "24/7 access",
                    "Priority support",
                    "Covered parking",
                ],
            },
            MonthlyPlan::Executive => PlanOffer {
                plan: *self,
                name: "Executive",
                monthly_price: 350,
                features: &[
                    "Premium reserved spot",
                    "24/7 access",
                    "Concierge support",
                    "Covered parking",
                    "EV charging",
                ],
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySubscription {
    pub user_id: String,
    pub plan: MonthlyPlan,
    pub license_plate: String,
    pub start_date: NaiveDate,
    pub monthly_price: u32,
}
