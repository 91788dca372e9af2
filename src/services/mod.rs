// Business logic over the lead store. The web layer calls these and renders;
// every rule about leads lives here or in `lifecycle`.

pub mod leads;
pub mod reports;
