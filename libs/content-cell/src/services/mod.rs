pub mod notice;
pub mod popup;
pub mod price;

pub use notice::NoticeService;
pub use popup::PopupService;
pub use price::PriceService;
