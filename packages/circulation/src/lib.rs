// ABOUTME: Lending workflows for Bookshare
// ABOUTME: Availability controller, approval gates and borrow/donation/wishlist flows

pub mod availability;
pub mod borrow;
pub mod donations;
pub mod donor;
pub mod gate;
pub mod records;
pub mod reports;
pub mod status;
pub mod wishlists;

// Re-export main types
pub use availability::BookAvailability;
pub use borrow::{AdminBorrowDecision, BorrowWorkflow};
pub use donations::{DonatedBook, DonationCreateInput, DonationDecision, DonationRequest, DonationWorkflow};
pub use donor::{DonorConfirmDecision, DonorConfirmations, PendingConfirm};
pub use gate::{Actor, ApprovalGate, Decision, Gated};
pub use records::{BorrowRecord, BorrowStatus};
pub use reports::{Dashboard, DashboardStats, OverdueLoan, PopularBook, ReminderSent, Reports, TopReader};
pub use status::{RequestStatus, WishlistStatus};
pub use wishlists::{WishlistCreateInput, WishlistDecision, WishlistItem, Wishlists};
