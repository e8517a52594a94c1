//! Funnel Engine - AI-personalized conversational funnels
//!
//! A visitor walks through a flow of phases and steps. Answers accumulate in
//! a session, and at configured moments a model-backed agent streams a
//! personalized message, optionally surfacing an embed (video, booking
//! calendar, testimonial) as a tool invocation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
