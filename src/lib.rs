//! lavage-capture
//!
//! 洗車受付用の撮影・送信ツール。カメラで車両とナンバーを撮影し、
//! 洗車タイプと一緒にWebhookへ送信して解析結果を承認する。

pub mod camera;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod interactive;
pub mod render;
pub mod workflow;
