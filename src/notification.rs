pub fn send(body: impl Into<String>) {
    let body = body.into();
    if let Err(err) = notify_rust::Notification::new()
        .appname("pdfshade")
        .summary("PDF filter")
        .body(&body)
        .timeout(notify_rust::Timeout::Milliseconds(2000))
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}
