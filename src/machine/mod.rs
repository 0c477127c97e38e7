pub mod m68;
