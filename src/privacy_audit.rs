// Privacy audit: static scan of every source file for tracing calls that
// would put query text, prompts or identifiers into the logs.
