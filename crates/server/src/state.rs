use citytransit::provider::TransitDataProvider;

pub struct AppState {
    pub provider: TransitDataProvider,
}

impl AppState {
    pub fn new(provider: TransitDataProvider) -> Self {
        Self { provider }
    }
}
