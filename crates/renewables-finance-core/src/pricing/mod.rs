pub mod gateway;

pub use gateway::{
    EscalatedPrices, EscalationSettings, MarketData, MerchantPriceGateway, NoMarketData, PriceEntry,
    PriceTable,
};
