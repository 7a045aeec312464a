pub(crate) mod catalog;
pub(crate) mod checkout;
pub(crate) mod inventory;
pub(crate) mod receipts;
