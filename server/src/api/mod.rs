//! REST API handlers.
//!
//! Handlers are thin: they extract, call one service method and let
//! [`AppError`](rifa_web::AppError) map failures to responses.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/auth/login`, `POST /api/auth/register` (public)
//! - `POST /api/auth/logout`, `GET /api/auth/profile` (session)
//!
//! ## Raffles and promotions
//! - `GET /api/raffles`, `/api/raffles/active`, `/api/raffles/:id` (public)
//! - `POST/PUT/DELETE /api/raffles[/:id]` (manage raffles)
//! - `GET /api/raffles/:id/promotions`, `/api/raffles/:id/quote` (public)
//! - `POST /api/raffles/:id/promotions`, `PUT/DELETE /api/promotions/:id` (manage promotions)
//!
//! ## Tickets
//! - `GET /api/raffles/:id/tickets[/available|/:number]`, `POST .../reserve` (public)
//! - `POST .../sell` (sell tickets), `GET .../summary` (view dashboard)
//! - `POST .../initialize`, `PUT .../status` (manage tickets)
//!
//! ## Users and content
//! - `/api/users[/:id]` (manage users)
//! - `GET /api/site`, `GET /api/content/:key` (public), `PUT /api/content/:key` (manage content)

pub mod auth;
pub mod promotions;
pub mod raffles;
pub mod site;
pub mod tickets;
pub mod users;
