// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt construction.

use odoobot_core::UserContext;

const DEFAULT_LANG: &str = "en_US";

const TOOL_INSTRUCTIONS: &str = "
You have DIRECT ACCESS to the Odoo database through the MCP server. You can:
- Search records: Use search_records(model, domain, fields, limit, order)
- Read a record: Use read_record(model, record_id, fields)

Common Odoo models:
- crm.lead: CRM leads and opportunities
- res.partner: Contacts and companies
- sale.order: Sales orders
- account.move: Invoices and bills
- product.product: Products

When users ask about Odoo data, ALWAYS use the tools to query the database directly instead of saying you cannot access it. For example:
- To find the latest lead: use search_records with model='crm.lead', order='create_date desc', limit=1
- To get partner details: use read_record with model='res.partner', record_id=ID, fields=['name', 'email', 'phone']
";

/// System prompt for `user`. `prefix` comes from the stored configuration.
pub fn build_system_prompt(user: &UserContext, prefix: Option<&str>, tools_enabled: bool) -> String {
    let lang = user
        .lang
        .as_deref()
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LANG);
    let tools = if tools_enabled { TOOL_INSTRUCTIONS } else { "" };

    let body = format!(
        "You are an AI assistant integrated with Odoo ERP system.

Current context:
- User: {name}
- Company: {company}
- Language: {lang}
{tools}
You have access to Odoo's business context and can help with:
- Answering questions about business data
- Explaining processes and workflows
- Providing insights and recommendations
- Helping with Odoo usage

Always provide helpful, accurate, and contextual responses.",
        name = user.name,
        company = user.company,
    );

    match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}\n\n{body}"),
        None => body,
    }
}
