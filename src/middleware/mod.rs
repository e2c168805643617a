/*
 * Responsibility
 * - Public surface of the middleware layer
 */
pub mod auth;
pub mod cors;
pub mod http;
