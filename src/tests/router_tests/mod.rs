mod report_routes;
