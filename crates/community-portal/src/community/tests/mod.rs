mod announcements;
mod applications;
mod common;
mod news;
mod partnerships;
mod requests;
mod roles;
