use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ToggleActivityRequest {
    pub activity_id: String,
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleActivityResponse {
    pub success: bool,
    pub new_balance: i64,
    pub bp_change: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetBalanceRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetBalanceResponse {
    pub success: bool,
    pub new_balance: i64,
}

#[derive(Debug, Deserialize)]
pub struct ToggleVipRequest {
    pub vip_status: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleVipResponse {
    pub success: bool,
    pub vip_status: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToggleEventRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleEventResponse {
    pub success: bool,
    pub event_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserDataResponse {
    pub vip_status: bool,
    pub balance: i64,
    pub completed_activities: Vec<String>,
    pub event_active: bool,
}
