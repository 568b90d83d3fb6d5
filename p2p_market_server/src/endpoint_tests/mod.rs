mod commands;
mod helpers;
mod mocks;
mod offers;
